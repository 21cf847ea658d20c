//! Module definitions
//!
//! A module type is a thin wrapper around a [`Record`] that names the Sugar
//! module it belongs to and the fields that should be requested from the
//! server. Field handles live as associated constants on the type:
//!
//! ```
//! use zucker_orm::{Module, Record, StringField};
//!
//! #[derive(Debug, Clone)]
//! struct Lead(Record);
//!
//! impl Lead {
//!     const NAME: StringField = StringField::new("name");
//! }
//!
//! impl Module for Lead {
//!     const API_NAME: &'static str = "Leads";
//!
//!     fn declared_fields() -> &'static [&'static str] {
//!         &["name"]
//!     }
//!
//!     fn from_record(record: Record) -> Self {
//!         Lead(record)
//!     }
//!
//!     fn record(&self) -> &Record {
//!         &self.0
//!     }
//!
//!     fn record_mut(&mut self) -> &mut Record {
//!         &mut self.0
//!     }
//! }
//!
//! assert_eq!(Lead::field_names(), vec!["id", "name"]);
//! ```

use crate::fields::IdField;
use crate::record::Record;
use zucker_core::{JsonMap, Result};

/// A record type bound to one Sugar module
pub trait Module: Clone + Send + Sync + 'static {
	/// Module name used in API endpoints
	const API_NAME: &'static str;

	/// Field handle for the record ID
	const ID: IdField = IdField::new("id");

	/// Names of the fields requested when listing records, besides `id`
	fn declared_fields() -> &'static [&'static str] {
		&[]
	}

	fn from_record(record: Record) -> Self;

	fn record(&self) -> &Record;

	fn record_mut(&mut self) -> &mut Record;

	/// Sorted field names sent as the `fields` query parameter
	fn field_names() -> Vec<&'static str> {
		let mut names: Vec<&'static str> = Self::declared_fields().to_vec();
		names.push("id");
		names.sort_unstable();
		names.dedup();
		names
	}

	/// Builds a record of this module from raw data
	fn new(data: JsonMap) -> Result<Self> {
		Ok(Self::from_record(Record::new(Self::API_NAME, data)?))
	}

	fn id(&self) -> Option<&str> {
		self.record().id()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[derive(Debug, Clone)]
	struct Contact(Record);

	impl Module for Contact {
		const API_NAME: &'static str = "Contacts";

		fn declared_fields() -> &'static [&'static str] {
			&["last_name", "first_name", "id"]
		}

		fn from_record(record: Record) -> Self {
			Contact(record)
		}

		fn record(&self) -> &Record {
			&self.0
		}

		fn record_mut(&mut self) -> &mut Record {
			&mut self.0
		}
	}

	#[rstest]
	fn test_field_names_are_sorted_and_unique() {
		assert_eq!(Contact::field_names(), vec!["first_name", "id", "last_name"]);
	}

	#[rstest]
	fn test_new_binds_record_to_module() {
		let mut data = JsonMap::new();
		data.insert("id".to_string(), json!("x"));

		let contact = Contact::new(data).unwrap();

		assert_eq!(contact.record().module(), "Contacts");
		assert_eq!(contact.id(), Some("x"));
	}
}
