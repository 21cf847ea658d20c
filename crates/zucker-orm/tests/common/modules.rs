//! Module types used across the tests

use zucker_orm::{IntegerField, Module, Record, RelatedField, StringField};

/// Module without declared fields, listing only IDs
#[derive(Debug, Clone)]
pub struct Demo(Record);

impl Demo {
	pub const NAME: StringField = StringField::new("name");
	pub const AGE: IntegerField = IntegerField::new("age");
	pub const FRIENDS: RelatedField<Demo> = RelatedField::new("friends");
}

impl Module for Demo {
	const API_NAME: &'static str = "Demo";

	fn from_record(record: Record) -> Self {
		Demo(record)
	}

	fn record(&self) -> &Record {
		&self.0
	}

	fn record_mut(&mut self) -> &mut Record {
		&mut self.0
	}
}

impl PartialEq for Demo {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

/// IDs of records from a view, in the order they came
pub fn ids(records: &[Demo]) -> Vec<String> {
	records
		.iter()
		.map(|record| record.id().unwrap_or_default().to_string())
		.collect()
}
