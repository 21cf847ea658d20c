//! Query string encoding of filter expressions
//!
//! Sugar reads filters from bracketed query keys. The expression
//! `{"name": {"$equals": "Ben"}}` becomes `filter[0][name][$equals]=Ben`.

use crate::types::GenericFilter;
use indexmap::IndexMap;
use serde_json::Value;
use zucker_core::{JsonMap, Result, ZuckerError, json::scalar_to_param};

/// Flattens a filter into `filter[...]` query parameters
///
/// Keys keep the order in which they appear in the expression.
///
/// # Examples
///
/// ```
/// use zucker_filters::{ValuesFilter, render_query_params};
///
/// let filter = ValuesFilter::new("name", ["Ben"]).unwrap();
/// let params = render_query_params(&filter).unwrap();
/// assert_eq!(params["filter[0][name][$equals]"], "Ben");
/// ```
pub fn render_query_params(filter: &impl GenericFilter) -> Result<IndexMap<String, String>> {
	render_filter_map(&filter.build_filter())
}

/// Same as [`render_query_params`] for an already rendered expression
pub fn render_filter_map(filter: &JsonMap) -> Result<IndexMap<String, String>> {
	let mut params = IndexMap::new();
	let root = Value::Array(vec![Value::Object(filter.clone())]);
	flatten("filter".to_string(), &root, &mut params)?;
	Ok(params)
}

fn flatten(prefix: String, value: &Value, params: &mut IndexMap<String, String>) -> Result<()> {
	match value {
		Value::Object(map) => {
			for (key, item) in map {
				flatten(format!("{prefix}[{key}]"), item, params)?;
			}
		}
		Value::Array(items) => {
			for (index, item) in items.iter().enumerate() {
				flatten(format!("{prefix}[{index}]"), item, params)?;
			}
		}
		scalar => {
			let rendered = scalar_to_param(scalar).ok_or_else(|| {
				ZuckerError::Validation(format!("invalid filter definition at {prefix}"))
			})?;
			params.insert(prefix, rendered);
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{NullishFilter, NumericFilter, ValuesFilter};
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_in_filter_is_indexed() {
		// Arrange
		let filter = ValuesFilter::new("last_name", ["Paul", "Spencer"]).unwrap();

		// Act
		let params = render_query_params(&filter).unwrap();

		// Assert
		assert_eq!(params.len(), 2);
		assert_eq!(params["filter[0][last_name][$in][0]"], "Paul");
		assert_eq!(params["filter[0][last_name][$in][1]"], "Spencer");
	}

	#[rstest]
	fn test_null_operand_renders_empty() {
		let params = render_query_params(&NullishFilter::new("employer")).unwrap();

		assert_eq!(params["filter[0][employer][$is_null]"], "");
	}

	#[rstest]
	fn test_scalars_render_through_json_form() {
		let number = NumericFilter::greater_than("age", json!(4)).unwrap();
		let boolean = ValuesFilter::new("active", [true]).unwrap();

		let number_params = render_query_params(&number).unwrap();
		let bool_params = render_query_params(&boolean).unwrap();

		assert_eq!(number_params["filter[0][age][$gt]"], "4");
		assert_eq!(bool_params["filter[0][active][$equals]"], "true");
	}

	#[rstest]
	fn test_nested_sets_keep_order() {
		let filter = ValuesFilter::new("a", ["1"]).unwrap() | NullishFilter::new("b");

		let keys: Vec<String> = render_query_params(&filter).unwrap().into_keys().collect();

		assert_eq!(
			keys,
			vec![
				"filter[0][$or][0][a][$equals]".to_string(),
				"filter[0][$or][1][b][$is_null]".to_string(),
			]
		);
	}
}
