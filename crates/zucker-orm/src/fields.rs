//! Typed field handles
//!
//! Fields are declared as associated constants on a module type. Each handle
//! has two uses: reading or writing the value on a record, and building filters
//! for that field. What a field supports is expressed through capability
//! traits:
//!
//! | Field            | [`LoadField`] | [`MutableField`] | [`ScalarFilters`] | [`NumericFilters`] |
//! |------------------|---------------|------------------|-------------------|--------------------|
//! | [`StringField`]  | yes           | yes              | yes               |                    |
//! | [`BooleanField`] | yes           | yes              | yes               |                    |
//! | [`IdField`]      | yes           |                  | yes               |                    |
//! | [`IntegerField`] | yes           | yes              | yes               | yes                |
//! | [`FloatField`]   | yes           | yes              | yes               | yes                |
//!
//! [`RelatedField`] yields views on linked records instead of a value.

use crate::module::Module;
use crate::view::{AsyncView, SyncView};
use serde_json::{Number, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;
use zucker_client::{AsyncClient, SyncClient};
use zucker_core::json::kind_of;
use zucker_core::{Result, ZuckerError};
use zucker_filters::{NullishFilter, NumericFilter, StringFilter, ValuesFilter};

/// Checks that a field name is usable in requests
pub fn validate_field_name(name: &str) -> Result<&str> {
	if name.is_empty() || name.contains(' ') {
		return Err(ZuckerError::Validation(format!(
			"field name '{name}' may not be empty and must not contain spaces"
		)));
	}
	Ok(name)
}

/// A named field of a module
pub trait Field {
	/// Name of the field in the API
	fn name(&self) -> &'static str;

	fn checked_name(&self) -> Result<&'static str> {
		let name = self.name();
		validate_field_name(name)?;
		Ok(name)
	}
}

/// Fields whose raw JSON value converts to a native type
pub trait LoadField: Field {
	type Native;

	/// Converts a raw API value into the native type
	fn load(&self, raw: &Value) -> Result<Self::Native>;

	/// Converts a native value into what the API expects
	fn serialize(&self, value: Self::Native) -> Result<Value>;

	/// Reads the field from a record
	///
	/// Missing and `null` values are reported as [`ZuckerError::UndefinedField`].
	fn get<M: Module>(&self, record: &M) -> Result<Self::Native> {
		let name = self.checked_name()?;
		match record.record().get(name) {
			None | Some(Value::Null) => Err(ZuckerError::UndefinedField(name.to_string())),
			Some(raw) => self.load(raw),
		}
	}
}

/// Fields that can be written back to the server
pub trait MutableField: LoadField {
	/// Stages a new value on the record
	fn set<M: Module>(&self, record: &mut M, value: Self::Native) -> Result<()> {
		let name = self.checked_name()?;
		let raw = self.serialize(value)?;
		record.record_mut().set(name, raw);
		Ok(())
	}
}

/// Equality and null checks
pub trait ScalarFilters: LoadField {
	/// Matches records whose value is one of `values`
	fn values<I>(&self, values: I) -> Result<ValuesFilter>
	where
		I: IntoIterator<Item = Self::Native>,
	{
		let name = self.checked_name()?;
		let serialized = values
			.into_iter()
			.map(|value| self.serialize(value))
			.collect::<Result<Vec<_>>>()?;
		ValuesFilter::new(name, serialized)
	}

	fn eq(&self, value: Self::Native) -> Result<ValuesFilter> {
		self.values([value])
	}

	fn ne(&self, value: Self::Native) -> Result<ValuesFilter> {
		Ok(!self.eq(value)?)
	}

	fn null(&self) -> Result<NullishFilter> {
		Ok(NullishFilter::new(self.checked_name()?))
	}

	fn not_null(&self) -> Result<NullishFilter> {
		Ok(!self.null()?)
	}
}

/// Ordering comparisons
pub trait NumericFilters: LoadField {
	fn gt(&self, value: Self::Native) -> Result<NumericFilter> {
		NumericFilter::greater_than(self.checked_name()?, self.serialize(value)?)
	}

	fn gte(&self, value: Self::Native) -> Result<NumericFilter> {
		NumericFilter::greater_or_equal(self.checked_name()?, self.serialize(value)?)
	}

	fn lt(&self, value: Self::Native) -> Result<NumericFilter> {
		NumericFilter::less_than(self.checked_name()?, self.serialize(value)?)
	}

	fn lte(&self, value: Self::Native) -> Result<NumericFilter> {
		NumericFilter::less_or_equal(self.checked_name()?, self.serialize(value)?)
	}
}

fn wrong_type(field: &str, expected: &str, raw: &Value) -> ZuckerError {
	ZuckerError::Validation(format!(
		"field '{field}' must be populated with {expected}, got {}",
		kind_of(raw)
	))
}

macro_rules! field_handle {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(Debug, Clone, Copy)]
		pub struct $name {
			name: &'static str,
		}

		impl $name {
			pub const fn new(name: &'static str) -> Self {
				Self { name }
			}
		}

		impl Field for $name {
			fn name(&self) -> &'static str {
				self.name
			}
		}
	};
}

field_handle!(
	/// Text values
	StringField
);
field_handle!(
	/// `true` / `false` values
	BooleanField
);
field_handle!(
	/// The record's UUID
	IdField
);
field_handle!(
	/// Whole numbers, also accepted as numeric strings
	IntegerField
);
field_handle!(
	/// Decimal numbers, also accepted as numeric strings
	FloatField
);

impl LoadField for StringField {
	type Native = String;

	fn load(&self, raw: &Value) -> Result<String> {
		raw.as_str()
			.map(str::to_string)
			.ok_or_else(|| wrong_type(self.name, "a string", raw))
	}

	fn serialize(&self, value: String) -> Result<Value> {
		Ok(Value::String(value))
	}
}

impl MutableField for StringField {}
impl ScalarFilters for StringField {}

impl StringField {
	pub fn starts_with(&self, prefix: impl Into<String>) -> Result<StringFilter> {
		StringFilter::starts_with(self.checked_name()?, prefix)
	}

	pub fn ends_with(&self, suffix: impl Into<String>) -> Result<StringFilter> {
		StringFilter::ends_with(self.checked_name()?, suffix)
	}

	pub fn contains(&self, infix: impl Into<String>) -> Result<StringFilter> {
		StringFilter::contains(self.checked_name()?, infix)
	}
}

impl LoadField for BooleanField {
	type Native = bool;

	fn load(&self, raw: &Value) -> Result<bool> {
		raw.as_bool()
			.ok_or_else(|| wrong_type(self.name, "a boolean", raw))
	}

	fn serialize(&self, value: bool) -> Result<Value> {
		Ok(Value::Bool(value))
	}
}

impl MutableField for BooleanField {}
impl ScalarFilters for BooleanField {}

impl BooleanField {
	pub fn is_true(&self) -> Result<ValuesFilter> {
		self.eq(true)
	}

	pub fn is_false(&self) -> Result<ValuesFilter> {
		self.eq(false)
	}
}

impl LoadField for IdField {
	type Native = Uuid;

	fn load(&self, raw: &Value) -> Result<Uuid> {
		let text = raw
			.as_str()
			.ok_or_else(|| wrong_type(self.name, "a string", raw))?;
		Uuid::parse_str(text)
			.map_err(|e| ZuckerError::Validation(format!("invalid record ID '{text}': {e}")))
	}

	fn serialize(&self, value: Uuid) -> Result<Value> {
		Ok(Value::String(value.to_string()))
	}
}

impl ScalarFilters for IdField {}

impl LoadField for IntegerField {
	type Native = i64;

	fn load(&self, raw: &Value) -> Result<i64> {
		match raw {
			Value::Number(number) => number.as_i64(),
			Value::String(text) => text.trim().parse().ok(),
			_ => None,
		}
		.ok_or_else(|| wrong_type(self.name, "an integer", raw))
	}

	fn serialize(&self, value: i64) -> Result<Value> {
		Ok(Value::from(value))
	}
}

impl MutableField for IntegerField {}
impl ScalarFilters for IntegerField {}
impl NumericFilters for IntegerField {}

impl LoadField for FloatField {
	type Native = f64;

	fn load(&self, raw: &Value) -> Result<f64> {
		match raw {
			Value::Number(number) => number.as_f64(),
			Value::String(text) => text.trim().parse().ok(),
			_ => None,
		}
		.ok_or_else(|| wrong_type(self.name, "a number", raw))
	}

	fn serialize(&self, value: f64) -> Result<Value> {
		Number::from_f64(value).map(Value::Number).ok_or_else(|| {
			ZuckerError::Validation(format!("field '{}' cannot store {value}", self.name))
		})
	}
}

impl MutableField for FloatField {}
impl ScalarFilters for FloatField {}
impl NumericFilters for FloatField {}

/// Link to records of module `R` related to a record
///
/// The view is served by `<module>/<id>/link/<link name>`.
#[derive(Debug)]
pub struct RelatedField<R> {
	link: &'static str,
	_related: PhantomData<fn() -> R>,
}

impl<R> Clone for RelatedField<R> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<R> Copy for RelatedField<R> {}

impl<R: Module> RelatedField<R> {
	pub const fn new(link: &'static str) -> Self {
		Self {
			link,
			_related: PhantomData,
		}
	}

	/// Link name with surrounding whitespace removed
	pub fn link(&self) -> Result<&'static str> {
		let link = self.link.trim();
		if link.is_empty() {
			return Err(ZuckerError::Validation(
				"related link names must be non-empty".to_string(),
			));
		}
		Ok(link)
	}

	/// Endpoint listing the records linked to `record`
	pub fn endpoint<M: Module>(&self, record: &M) -> Result<String> {
		let link = self.link()?;
		let id = record.id().ok_or_else(|| {
			ZuckerError::Validation("unable to retrieve key for related lookup".to_string())
		})?;
		Ok(format!("{}/{id}/link/{link}", M::API_NAME))
	}

	pub fn sync_view<M, C>(&self, record: &M, client: Arc<C>) -> Result<SyncView<R, C>>
	where
		M: Module,
		C: SyncClient + ?Sized,
	{
		Ok(SyncView::with_endpoint(client, self.endpoint(record)?))
	}

	pub fn async_view<M, C>(&self, record: &M, client: Arc<C>) -> Result<AsyncView<R, C>>
	where
		M: Module,
		C: AsyncClient + ?Sized,
	{
		Ok(AsyncView::with_endpoint(client, self.endpoint(record)?))
	}
}
