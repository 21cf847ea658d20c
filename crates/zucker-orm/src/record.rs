//! Raw record state
//!
//! A [`Record`] holds the data the server last confirmed plus the values that
//! were changed locally since. Reads see local changes first. Server
//! operations are split into a `prepare_*` step that describes the request and
//! a `finalize_*` step that applies the response, so the same logic serves
//! blocking and async managers.

use http::Method;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use zucker_client::Request;
use zucker_core::{JsonMap, Result, ZuckerError};

/// An (HTTP method, endpoint, JSON body) triple for a record operation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
	pub method: Method,
	pub endpoint: String,
	pub json: Option<JsonMap>,
}

impl MutationRequest {
	fn new(method: Method, endpoint: String) -> Self {
		Self {
			method,
			endpoint,
			json: None,
		}
	}

	pub fn into_request(self) -> Request {
		let request = Request::new(self.method, self.endpoint);
		match self.json {
			Some(json) => request.with_json(json),
			None => request,
		}
	}
}

impl From<MutationRequest> for Request {
	fn from(mutation: MutationRequest) -> Self {
		mutation.into_request()
	}
}

/// Field data of one record in a Sugar module
#[derive(Debug, Clone)]
pub struct Record {
	module: &'static str,
	original: JsonMap,
	updated: JsonMap,
}

impl Record {
	/// Builds a record from a server or user supplied payload
	///
	/// Keys starting with an underscore are metadata and dropped. If the payload
	/// names its module in `_module`, it has to match `module`.
	pub fn new(module: &'static str, data: JsonMap) -> Result<Self> {
		let mut record = Self {
			module,
			original: JsonMap::new(),
			updated: JsonMap::new(),
		};
		record.set_data(data)?;
		Ok(record)
	}

	fn set_data(&mut self, data: JsonMap) -> Result<()> {
		if let Some(given) = data.get("_module") {
			if given.as_str() != Some(self.module) {
				return Err(ZuckerError::Validation(format!(
					"trying to set {} record data with the wrong API type - got {given}, expecting {}",
					self.module, self.module
				)));
			}
		}
		self.original = data
			.into_iter()
			.filter(|(key, _)| !key.starts_with('_'))
			.collect();
		self.updated.clear();
		Ok(())
	}

	/// API name of the module this record belongs to
	pub fn module(&self) -> &'static str {
		self.module
	}

	/// Current value of `key`, preferring unsaved changes
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.updated.get(key).or_else(|| self.original.get(key))
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str)
	}

	/// Stages a new value for `key`
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.updated.insert(key.into(), value.into());
	}

	pub fn id(&self) -> Option<&str> {
		self.get_str("id")
	}

	/// Whether the record exists on the server
	pub fn is_saved(&self) -> bool {
		self.id().is_some()
	}

	/// Whether there are staged values that have not been saved
	pub fn has_changes(&self) -> bool {
		!self.updated.is_empty()
	}

	/// Merged view of all data, staged values winning
	pub fn data(&self) -> JsonMap {
		let mut data = self.original.clone();
		data.extend(self.updated.clone());
		data
	}

	fn mutation_endpoint(&self) -> Result<String> {
		let id = self.id().ok_or(ZuckerError::UnsavedRecord)?;
		Ok(format!("{}/{id}", self.module))
	}

	/// Describes the request that writes staged data to the server
	///
	/// New records are created with all their data. Existing records only send
	/// the staged values.
	pub fn prepare_save(&self) -> Result<MutationRequest> {
		let saved_id = self.id();
		let keys: BTreeSet<&String> = match saved_id {
			None => self.original.keys().chain(self.updated.keys()).collect(),
			Some(_) => self.updated.keys().collect(),
		};

		let mut payload = JsonMap::new();
		for key in keys {
			if key.starts_with('_') {
				return Err(ZuckerError::Validation(format!(
					"cannot save underscore-prefixed key '{key}'"
				)));
			}
			if let Some(value) = self.get(key) {
				payload.insert(key.clone(), value.clone());
			}
		}

		let mutation = match saved_id {
			None => MutationRequest::new(Method::POST, self.module.to_string()),
			Some(id) => {
				if payload.contains_key("id") {
					return Err(ZuckerError::Validation(
						"cannot change a record's ID".to_string(),
					));
				}
				MutationRequest::new(Method::PUT, format!("{}/{id}", self.module))
			}
		};
		Ok(MutationRequest {
			json: Some(payload),
			..mutation
		})
	}

	/// Replaces all data with what the server returned after saving
	pub fn finalize_save(&mut self, data: JsonMap) -> Result<()> {
		self.set_data(data)
	}

	pub fn prepare_delete(&self) -> Result<MutationRequest> {
		Ok(MutationRequest::new(Method::DELETE, self.mutation_endpoint()?))
	}

	/// Keeps the last known values but forgets the ID
	///
	/// Saving the record afterwards creates a new one on the server.
	pub fn finalize_delete(&mut self) {
		let updated = std::mem::take(&mut self.updated);
		self.original.extend(updated);
		self.original.remove("id");
	}

	pub fn prepare_refresh(&self) -> Result<MutationRequest> {
		Ok(MutationRequest::new(Method::GET, self.mutation_endpoint()?))
	}

	/// Replaces all data with the server's, dropping staged values
	pub fn finalize_refresh(&mut self, data: JsonMap) -> Result<()> {
		self.set_data(data)
	}
}

impl fmt::Display for Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<{} record", self.module)?;
		if let Some(id) = self.id() {
			write!(f, " {id}")?;
		}
		if let Some(name) = self.get_str("name") {
			write!(f, " - {name}")?;
		}
		f.write_str(">")
	}
}

/// Records are equal when they belong to the same module and share an ID
///
/// Unsaved records are never equal to anything, not even themselves.
impl PartialEq for Record {
	fn eq(&self, other: &Self) -> bool {
		match (self.id(), other.id()) {
			(Some(left), Some(right)) => self.module == other.module && left == right,
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn data(value: Value) -> JsonMap {
		match value {
			Value::Object(map) => map,
			_ => unreachable!(),
		}
	}

	#[rstest]
	fn test_new_strips_metadata_keys() {
		let record = Record::new(
			"Demo",
			data(json!({"_module": "Demo", "_acl": {}, "id": "abc", "name": "Ben"})),
		)
		.unwrap();

		assert_eq!(record.id(), Some("abc"));
		assert_eq!(record.get("_acl"), None);
		assert_eq!(record.data().len(), 2);
	}

	#[rstest]
	fn test_new_rejects_foreign_module() {
		let error = Record::new("Demo", data(json!({"_module": "Leads"}))).unwrap_err();

		assert!(error.is_validation());
		assert!(error.to_string().contains("Leads"));
	}

	#[rstest]
	fn test_staged_values_shadow_original() {
		// Arrange
		let mut record = Record::new("Demo", data(json!({"name": "Ben"}))).unwrap();

		// Act
		record.set("name", "Paul");

		// Assert
		assert_eq!(record.get_str("name"), Some("Paul"));
		assert!(record.has_changes());
	}

	#[rstest]
	fn test_save_new_record_sends_everything() {
		// Arrange
		let mut record = Record::new("Demo", data(json!({"name": "Ben"}))).unwrap();
		record.set("age", 4);

		// Act
		let mutation = record.prepare_save().unwrap();

		// Assert
		assert_eq!(mutation.method, Method::POST);
		assert_eq!(mutation.endpoint, "Demo");
		assert_eq!(
			Value::Object(mutation.json.unwrap()),
			json!({"name": "Ben", "age": 4})
		);
	}

	#[rstest]
	fn test_save_existing_record_sends_changes_only() {
		// Arrange
		let mut record = Record::new("Demo", data(json!({"id": "abc", "name": "Ben"}))).unwrap();
		record.set("age", 4);

		// Act
		let mutation = record.prepare_save().unwrap();

		// Assert
		assert_eq!(mutation.method, Method::PUT);
		assert_eq!(mutation.endpoint, "Demo/abc");
		assert_eq!(Value::Object(mutation.json.unwrap()), json!({"age": 4}));
	}

	#[rstest]
	#[case("_hidden")]
	#[case("id")]
	fn test_save_rejects_protected_keys(#[case] key: &str) {
		let mut record = Record::new("Demo", data(json!({"id": "abc"}))).unwrap();
		record.set(key, "x");

		let error = record.prepare_save().unwrap_err();

		assert!(error.is_validation());
	}

	#[rstest]
	fn test_unsaved_record_cannot_be_deleted_or_refreshed() {
		let record = Record::new("Demo", JsonMap::new()).unwrap();

		assert!(matches!(record.prepare_delete(), Err(ZuckerError::UnsavedRecord)));
		assert!(matches!(record.prepare_refresh(), Err(ZuckerError::UnsavedRecord)));
	}

	#[rstest]
	fn test_finalize_delete_keeps_values_without_id() {
		// Arrange
		let mut record = Record::new("Demo", data(json!({"id": "abc", "name": "Ben"}))).unwrap();
		record.set("name", "Paul");

		// Act
		record.finalize_delete();

		// Assert
		assert_eq!(record.id(), None);
		assert_eq!(record.get_str("name"), Some("Paul"));
		assert!(!record.has_changes());
		assert_eq!(record.prepare_save().unwrap().method, Method::POST);
	}

	#[rstest]
	fn test_finalize_refresh_drops_staged_values() {
		let mut record = Record::new("Demo", data(json!({"id": "abc", "name": "Ben"}))).unwrap();
		record.set("name", "Paul");

		record
			.finalize_refresh(data(json!({"id": "abc", "name": "Benjamin"})))
			.unwrap();

		assert_eq!(record.get_str("name"), Some("Benjamin"));
		assert!(!record.has_changes());
	}

	#[rstest]
	#[case(json!({"id": "abc", "name": "Ben"}), "<Demo record abc - Ben>")]
	#[case(json!({"id": "abc"}), "<Demo record abc>")]
	#[case(json!({}), "<Demo record>")]
	fn test_display(#[case] payload: Value, #[case] expected: &str) {
		let record = Record::new("Demo", data(payload)).unwrap();

		assert_eq!(record.to_string(), expected);
	}

	#[rstest]
	fn test_equality_needs_module_and_id() {
		let a = Record::new("Demo", data(json!({"id": "1", "name": "a"}))).unwrap();
		let b = Record::new("Demo", data(json!({"id": "1", "name": "b"}))).unwrap();
		let other_module = Record::new("Leads", data(json!({"id": "1"}))).unwrap();
		let unsaved = Record::new("Demo", JsonMap::new()).unwrap();

		assert_eq!(a, b);
		assert_ne!(a, other_module);
		assert_ne!(unsaved, unsaved.clone());
	}
}
