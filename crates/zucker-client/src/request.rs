//! Request and response values exchanged with transports

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use zucker_core::{JsonMap, Result, ZuckerError};

/// A logical request against one REST endpoint
///
/// `endpoint` is the part of the URL after `/rest/<version>/`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
	pub method: Method,
	pub endpoint: String,
	pub params: IndexMap<String, String>,
	/// Form-encoded body
	pub form: Option<IndexMap<String, String>>,
	/// JSON body
	pub json: Option<JsonMap>,
}

impl Request {
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			method,
			endpoint: endpoint.into(),
			params: IndexMap::new(),
			form: None,
			json: None,
		}
	}

	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::GET, endpoint)
	}

	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::POST, endpoint)
	}

	pub fn put(endpoint: impl Into<String>) -> Self {
		Self::new(Method::PUT, endpoint)
	}

	pub fn delete(endpoint: impl Into<String>) -> Self {
		Self::new(Method::DELETE, endpoint)
	}

	pub fn with_params(mut self, params: IndexMap<String, String>) -> Self {
		self.params.extend(params);
		self
	}

	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}

	pub fn with_form(mut self, form: IndexMap<String, String>) -> Self {
		self.form = Some(form);
		self
	}

	pub fn with_json(mut self, json: JsonMap) -> Self {
		self.json = Some(json);
		self
	}

	/// URL-encoded query string, without the leading `?`
	pub fn query_string(&self) -> Result<String> {
		let pairs: Vec<(&str, &str)> = self
			.params
			.iter()
			.map(|(key, value)| (key.as_str(), value.as_str()))
			.collect();
		serde_urlencoded::to_string(pairs)
			.map_err(|e| ZuckerError::Validation(format!("cannot encode query parameters: {e}")))
	}

	/// Entry describing this request inside a `bulk` payload
	///
	/// The URL is relative to `/rest`, so it starts with the API version.
	pub fn bulk_entry(&self, api_version: &str) -> Result<Value> {
		if self.form.is_some() {
			return Err(ZuckerError::Validation(
				"form-encoded requests cannot be sent in a bulk call".to_string(),
			));
		}

		let query = self.query_string()?;
		let mut url = format!("/{api_version}/{}", self.endpoint);
		if !query.is_empty() {
			url.push('?');
			url.push_str(&query);
		}

		let mut entry = JsonMap::new();
		entry.insert("url".to_string(), Value::String(url));
		entry.insert(
			"method".to_string(),
			Value::String(self.method.as_str().to_string()),
		);
		if let Some(json) = &self.json {
			entry.insert(
				"data".to_string(),
				Value::String(serde_json::to_string(json)?),
			);
		}
		Ok(Value::Object(entry))
	}
}

/// A request ready to hit the wire
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
	/// Absolute URL of the endpoint
	pub url: String,
	/// Value of the `OAuth-Token` header, if any
	pub token: Option<String>,
	pub request: Request,
}

/// Status code and decoded body of a physical response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
	pub status: u16,
	pub body: Value,
}

impl RawResponse {
	pub fn new(status: u16, body: Value) -> Self {
		Self { status, body }
	}

	pub fn ok(body: Value) -> Self {
		Self::new(200, body)
	}

	/// Turns an error status into [`ZuckerError::Api`] and returns the body otherwise
	pub fn into_checked_body(self) -> Result<Value> {
		if self.status < 400 {
			return Ok(self.body);
		}
		let message = self
			.body
			.get("error_message")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| format!("request failed with status {}", self.status));
		Err(ZuckerError::Api {
			status: self.status,
			message,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_query_string_keeps_order() {
		let request = Request::get("Demo")
			.with_param("max_num", "1")
			.with_param("offset", "3")
			.with_param("filter[0][id][$equals]", "x y");

		let query = request.query_string().unwrap();

		assert_eq!(
			query,
			"max_num=1&offset=3&filter%5B0%5D%5Bid%5D%5B%24equals%5D=x+y"
		);
	}

	#[rstest]
	fn test_bulk_entry() {
		// Arrange
		let mut body = JsonMap::new();
		body.insert("name".to_string(), json!("Gustave"));
		let request = Request::put("Demo/abc").with_param("a", "b").with_json(body);

		// Act
		let entry = request.bulk_entry("v11_5").unwrap();

		// Assert
		assert_eq!(
			entry,
			json!({
				"url": "/v11_5/Demo/abc?a=b",
				"method": "PUT",
				"data": "{\"name\":\"Gustave\"}",
			})
		);
	}

	#[rstest]
	fn test_bulk_entry_without_query() {
		let entry = Request::get("Demo/count").bulk_entry("v11_5").unwrap();

		assert_eq!(entry, json!({"url": "/v11_5/Demo/count", "method": "GET"}));
	}

	#[rstest]
	fn test_error_status_carries_message() {
		let response = RawResponse::new(500, json!({"error_message": "Oops!"}));

		let error = response.into_checked_body().unwrap_err();

		assert_eq!(error.status(), Some(500));
		assert_eq!(error.to_string(), "Server error (HTTP 500): Oops!");
	}
}
