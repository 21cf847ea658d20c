//! Single-field predicates
//!
//! Each filter here tests one field against one condition. Filters are
//! immutable: negation and combination produce new values.

use crate::types::GenericFilter;
use serde_json::{Number, Value};
use std::ops::Not;
use zucker_core::{JsonMap, Result, ZuckerError, json::kind_of};

/// A predicate on a single field
///
/// Implementors only describe the field, the wire operator and the operand.
/// Rendering is shared through [`GenericFilter`].
pub trait BasicFilter {
	/// Name of the field under test
	fn field_name(&self) -> &str;

	/// Sugar operator, like `$equals` or `$gte`
	fn operator(&self) -> &'static str;

	/// Operand sent next to the operator
	fn filter_value(&self) -> Value;
}

impl<T: BasicFilter> GenericFilter for T {
	fn build_filter(&self) -> JsonMap {
		let mut condition = JsonMap::new();
		condition.insert(self.operator().to_string(), self.filter_value());
		let mut filter = JsonMap::new();
		filter.insert(self.field_name().to_string(), Value::Object(condition));
		filter
	}
}

/// Exact match against one or more values
///
/// A single value renders as `$equals`, several as `$in`. Negation flips to
/// `$not_equals` and `$not_in` respectively.
///
/// # Examples
///
/// ```
/// use zucker_filters::{GenericFilter, ValuesFilter};
/// use serde_json::json;
///
/// let filter = ValuesFilter::new("last_name", ["Paul", "Spencer"]).unwrap();
/// assert_eq!(
///     serde_json::Value::Object(filter.build_filter()),
///     json!({"last_name": {"$in": ["Paul", "Spencer"]}})
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesFilter {
	field_name: String,
	values: Vec<Value>,
	negated: bool,
}

impl ValuesFilter {
	/// Creates a filter accepting any of the given values
	///
	/// # Errors
	///
	/// Returns [`ZuckerError::Validation`] if no values are given or if one of
	/// them is not a string, number or boolean.
	pub fn new<I, V>(field_name: impl Into<String>, values: I) -> Result<Self>
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let values: Vec<Value> = values.into_iter().map(Into::into).collect();
		if values.is_empty() {
			return Err(ZuckerError::Validation(
				"did not provide any values for a value filter".to_string(),
			));
		}
		if let Some(bad) = values
			.iter()
			.find(|value| !(value.is_string() || value.is_number() || value.is_boolean()))
		{
			return Err(ZuckerError::Validation(format!(
				"values for a value filter must be scalars, got {}",
				kind_of(bad)
			)));
		}
		Ok(Self {
			field_name: field_name.into(),
			values,
			negated: false,
		})
	}

	pub fn values(&self) -> &[Value] {
		&self.values
	}

	pub fn is_negated(&self) -> bool {
		self.negated
	}

	fn is_single(&self) -> bool {
		self.values.len() == 1
	}
}

impl BasicFilter for ValuesFilter {
	fn field_name(&self) -> &str {
		&self.field_name
	}

	fn operator(&self) -> &'static str {
		match (self.is_single(), self.negated) {
			(true, false) => "$equals",
			(true, true) => "$not_equals",
			(false, false) => "$in",
			(false, true) => "$not_in",
		}
	}

	fn filter_value(&self) -> Value {
		if self.is_single() {
			self.values[0].clone()
		} else {
			Value::Array(self.values.clone())
		}
	}
}

impl Not for ValuesFilter {
	type Output = ValuesFilter;

	fn not(self) -> Self::Output {
		Self {
			negated: !self.negated,
			..self
		}
	}
}

/// Checks whether a field is `null`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullishFilter {
	field_name: String,
	negated: bool,
}

impl NullishFilter {
	/// Matches records where the field is `null`
	pub fn new(field_name: impl Into<String>) -> Self {
		Self {
			field_name: field_name.into(),
			negated: false,
		}
	}

	pub fn is_negated(&self) -> bool {
		self.negated
	}
}

impl BasicFilter for NullishFilter {
	fn field_name(&self) -> &str {
		&self.field_name
	}

	fn operator(&self) -> &'static str {
		if self.negated { "$not_null" } else { "$is_null" }
	}

	fn filter_value(&self) -> Value {
		Value::Null
	}
}

impl Not for NullishFilter {
	type Output = NullishFilter;

	fn not(self) -> Self::Output {
		Self {
			negated: !self.negated,
			..self
		}
	}
}

/// Kind of pattern match performed by a [`StringFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringMatch {
	Starts,
	Ends,
	Contains,
}

impl StringMatch {
	fn operator(self) -> &'static str {
		match self {
			StringMatch::Starts => "$starts",
			StringMatch::Ends => "$ends",
			StringMatch::Contains => "$contains",
		}
	}
}

/// Pattern match on a string field
///
/// String filters cannot be negated, the server has no operator for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFilter {
	field_name: String,
	kind: StringMatch,
	pattern: String,
}

impl StringFilter {
	/// Creates a string filter
	///
	/// # Errors
	///
	/// Returns [`ZuckerError::Validation`] for an empty pattern.
	pub fn new(
		field_name: impl Into<String>,
		kind: StringMatch,
		pattern: impl Into<String>,
	) -> Result<Self> {
		let pattern = pattern.into();
		if pattern.is_empty() {
			return Err(ZuckerError::Validation(
				"cannot filter for empty strings".to_string(),
			));
		}
		Ok(Self {
			field_name: field_name.into(),
			kind,
			pattern,
		})
	}

	pub fn starts_with(field_name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
		Self::new(field_name, StringMatch::Starts, pattern)
	}

	pub fn ends_with(field_name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
		Self::new(field_name, StringMatch::Ends, pattern)
	}

	pub fn contains(field_name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
		Self::new(field_name, StringMatch::Contains, pattern)
	}

	pub fn kind(&self) -> StringMatch {
		self.kind
	}
}

impl BasicFilter for StringFilter {
	fn field_name(&self) -> &str {
		&self.field_name
	}

	fn operator(&self) -> &'static str {
		self.kind.operator()
	}

	fn filter_value(&self) -> Value {
		Value::String(self.pattern.clone())
	}
}

/// Ordered comparison against a number
///
/// Negation flips both flags, so `>` becomes `<=` and `>=` becomes `<`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFilter {
	field_name: String,
	value: Number,
	greater: bool,
	equal: bool,
}

impl NumericFilter {
	/// Creates a comparison filter
	///
	/// # Errors
	///
	/// Returns [`ZuckerError::Validation`] if `value` is not a JSON number.
	pub fn new(field_name: impl Into<String>, value: Value, greater: bool, equal: bool) -> Result<Self> {
		match value {
			Value::Number(value) => Ok(Self {
				field_name: field_name.into(),
				value,
				greater,
				equal,
			}),
			other => Err(ZuckerError::Validation(format!(
				"numeric filters only work with numbers, got {}",
				kind_of(&other)
			))),
		}
	}

	pub fn greater_than(field_name: impl Into<String>, value: Value) -> Result<Self> {
		Self::new(field_name, value, true, false)
	}

	pub fn greater_or_equal(field_name: impl Into<String>, value: Value) -> Result<Self> {
		Self::new(field_name, value, true, true)
	}

	pub fn less_than(field_name: impl Into<String>, value: Value) -> Result<Self> {
		Self::new(field_name, value, false, false)
	}

	pub fn less_or_equal(field_name: impl Into<String>, value: Value) -> Result<Self> {
		Self::new(field_name, value, false, true)
	}
}

impl BasicFilter for NumericFilter {
	fn field_name(&self) -> &str {
		&self.field_name
	}

	fn operator(&self) -> &'static str {
		match (self.greater, self.equal) {
			(true, false) => "$gt",
			(true, true) => "$gte",
			(false, false) => "$lt",
			(false, true) => "$lte",
		}
	}

	fn filter_value(&self) -> Value {
		Value::Number(self.value.clone())
	}
}

impl Not for NumericFilter {
	type Output = NumericFilter;

	fn not(self) -> Self::Output {
		Self {
			greater: !self.greater,
			equal: !self.equal,
			..self
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn rendered(filter: &impl GenericFilter) -> Value {
		Value::Object(filter.build_filter())
	}

	#[rstest]
	fn test_single_value_renders_equals() {
		// Arrange
		let filter = ValuesFilter::new("name", ["Ben"]).unwrap();

		// Act
		let positive = rendered(&filter);
		let negative = rendered(&!filter);

		// Assert
		assert_eq!(positive, json!({"name": {"$equals": "Ben"}}));
		assert_eq!(negative, json!({"name": {"$not_equals": "Ben"}}));
	}

	#[rstest]
	fn test_multiple_values_render_in() {
		let filter = ValuesFilter::new("last_name", ["Paul", "Spencer"]).unwrap();

		assert_eq!(
			rendered(&!filter),
			json!({"last_name": {"$not_in": ["Paul", "Spencer"]}})
		);
	}

	#[rstest]
	fn test_double_negation_is_identity() {
		let filter = ValuesFilter::new("name", ["Ben"]).unwrap();

		assert_eq!(!!filter.clone(), filter);
	}

	#[rstest]
	fn test_values_filter_requires_values() {
		let result = ValuesFilter::new("name", Vec::<String>::new());

		assert!(result.unwrap_err().is_validation());
	}

	#[rstest]
	fn test_values_filter_rejects_non_scalars() {
		let result = ValuesFilter::new("name", [json!({"a": 1})]);

		assert!(result.unwrap_err().is_validation());
	}

	#[rstest]
	fn test_nullish_filter() {
		let filter = NullishFilter::new("employer");

		assert_eq!(rendered(&filter), json!({"employer": {"$is_null": null}}));
		assert_eq!(rendered(&!filter), json!({"employer": {"$not_null": null}}));
	}

	#[rstest]
	#[case(StringMatch::Starts, "$starts")]
	#[case(StringMatch::Ends, "$ends")]
	#[case(StringMatch::Contains, "$contains")]
	fn test_string_filter_operators(#[case] kind: StringMatch, #[case] operator: &str) {
		let filter = StringFilter::new("name", kind, "Gu").unwrap();

		assert_eq!(rendered(&filter), json!({"name": {operator: "Gu"}}));
	}

	#[rstest]
	fn test_string_filter_rejects_empty_pattern() {
		let result = StringFilter::contains("name", "");

		assert!(result.unwrap_err().is_validation());
	}

	#[rstest]
	#[case(true, false, "$gt", "$lte")]
	#[case(true, true, "$gte", "$lt")]
	#[case(false, false, "$lt", "$gte")]
	#[case(false, true, "$lte", "$gt")]
	fn test_numeric_filter_inversion(
		#[case] greater: bool,
		#[case] equal: bool,
		#[case] operator: &str,
		#[case] inverted: &str,
	) {
		// Arrange
		let filter = NumericFilter::new("age", json!(4), greater, equal).unwrap();

		// Act & Assert
		assert_eq!(filter.operator(), operator);
		assert_eq!((!filter).operator(), inverted);
	}

	#[rstest]
	fn test_numeric_filter_requires_number() {
		let result = NumericFilter::greater_than("age", json!("four"));

		assert!(result.unwrap_err().is_validation());
	}
}
