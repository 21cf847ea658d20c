//! JSON helpers for server payloads

use crate::error::{Result, ZuckerError};
use serde_json::Value;

/// A JSON object as returned by the server
pub type JsonMap = serde_json::Map<String, Value>;

/// Unwraps a JSON object, failing with [`ZuckerError::InvalidResponse`] otherwise
///
/// `context` names the payload in the error message.
pub fn expect_object(value: Value, context: &str) -> Result<JsonMap> {
	match value {
		Value::Object(map) => Ok(map),
		other => Err(ZuckerError::InvalidResponse(format!(
			"expected {context} to be a JSON object, got {}",
			kind_of(&other)
		))),
	}
}

/// Reads a string entry from a server object
pub fn require_str<'a>(map: &'a JsonMap, key: &str) -> Result<&'a str> {
	map.get(key).and_then(Value::as_str).ok_or_else(|| {
		ZuckerError::InvalidResponse(format!("missing string field '{key}' in server response"))
	})
}

/// Renders a scalar for use in a query string
///
/// Strings are used as-is, numbers and booleans through their JSON form and
/// `null` as an empty value. Arrays and objects are not scalars.
pub fn scalar_to_param(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Null => Some(String::new()),
		Value::Array(_) | Value::Object(_) => None,
	}
}

/// Short name of a JSON value's kind, for error messages
pub fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_expect_object_rejects_arrays() {
		let result = expect_object(json!([1, 2]), "count response");

		let error = result.unwrap_err();
		assert!(error.is_invalid_response());
		assert!(error.to_string().contains("count response"));
	}

	#[rstest]
	#[case(json!("abc"), Some("abc"))]
	#[case(json!(4), Some("4"))]
	#[case(json!(true), Some("true"))]
	#[case(json!(null), Some(""))]
	#[case(json!([1]), None)]
	fn test_scalar_to_param(#[case] value: Value, #[case] expected: Option<&str>) {
		assert_eq!(scalar_to_param(&value).as_deref(), expected);
	}

	#[rstest]
	fn test_require_str() {
		let map = expect_object(json!({"a": "b", "n": 1}), "payload").unwrap();

		assert_eq!(require_str(&map, "a").unwrap(), "b");
		assert!(require_str(&map, "n").is_err());
	}
}
