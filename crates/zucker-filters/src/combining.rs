//! Boolean combination of filters

use crate::basic::{NullishFilter, NumericFilter, StringFilter, ValuesFilter};
use crate::types::{Combinator, GenericFilter};
use serde_json::Value;
use std::ops::{BitAnd, BitOr};
use zucker_core::JsonMap;

/// Any filter expression a view can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	/// A hand-written filter in Sugar's own JSON syntax
	Raw(JsonMap),
	/// A rendered single-field predicate
	Predicate(JsonMap),
	/// A combination of other filters
	Set(FilterSet),
}

impl Filter {
	/// Returns true for predicates and filter sets, false for raw JSON
	pub fn is_expression(&self) -> bool {
		!matches!(self, Filter::Raw(_))
	}
}

impl GenericFilter for Filter {
	fn build_filter(&self) -> JsonMap {
		match self {
			Filter::Raw(map) | Filter::Predicate(map) => map.clone(),
			Filter::Set(set) => set.build_filter(),
		}
	}
}

impl From<JsonMap> for Filter {
	fn from(map: JsonMap) -> Self {
		Filter::Raw(map)
	}
}

impl From<FilterSet> for Filter {
	fn from(set: FilterSet) -> Self {
		Filter::Set(set)
	}
}

macro_rules! predicate_into_filter {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Filter {
				fn from(filter: $ty) -> Self {
					Filter::Predicate(filter.build_filter())
				}
			}
		)*
	};
}

predicate_into_filter!(ValuesFilter, NullishFilter, StringFilter, NumericFilter);

/// Several filters joined by one [`Combinator`]
///
/// Parts are rendered when the set is built, so later changes to the source
/// filters never leak into the set. Nested sets are flattened whenever that
/// keeps the boolean meaning:
///
/// * the nested set uses the same combinator,
/// * the nested set has fewer than two parts,
/// * the nested set is the only part (its combinator is adopted).
///
/// # Examples
///
/// ```
/// use zucker_filters::{Combinator, FilterSet, GenericFilter, ValuesFilter};
///
/// let a = ValuesFilter::new("a", ["1"]).unwrap();
/// let b = ValuesFilter::new("b", ["2"]).unwrap();
/// let c = ValuesFilter::new("c", ["3"]).unwrap();
///
/// let nested = (a.clone() & b.clone()) & c.clone();
/// let flat = FilterSet::new(Combinator::And, [a.into(), b.into(), c.into()]);
/// assert_eq!(nested.build_filter(), flat.build_filter());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
	combinator: Combinator,
	parts: Vec<JsonMap>,
}

impl FilterSet {
	pub fn new<I>(combinator: Combinator, parts: I) -> Self
	where
		I: IntoIterator<Item = Filter>,
	{
		let given: Vec<Filter> = parts.into_iter().collect();
		let only_part = given.len() == 1;

		let mut set = Self {
			combinator,
			parts: Vec::with_capacity(given.len()),
		};
		for part in given {
			match part {
				Filter::Set(inner)
					if inner.combinator == combinator || inner.parts.len() < 2 || only_part =>
				{
					if only_part {
						set.combinator = inner.combinator;
					}
					set.parts.extend(inner.parts);
				}
				other => set.parts.push(other.build_filter()),
			}
		}
		set
	}

	pub fn and<I: IntoIterator<Item = Filter>>(parts: I) -> Self {
		Self::new(Combinator::And, parts)
	}

	pub fn or<I: IntoIterator<Item = Filter>>(parts: I) -> Self {
		Self::new(Combinator::Or, parts)
	}

	pub fn combinator(&self) -> Combinator {
		self.combinator
	}

	pub fn parts(&self) -> &[JsonMap] {
		&self.parts
	}
}

impl GenericFilter for FilterSet {
	fn build_filter(&self) -> JsonMap {
		let parts = self.parts.iter().cloned().map(Value::Object).collect();
		let mut filter = JsonMap::new();
		filter.insert(self.combinator.key().to_string(), Value::Array(parts));
		filter
	}
}

macro_rules! combine_operators {
	($($ty:ty),* $(,)?) => {
		$(
			impl<R: Into<Filter>> BitAnd<R> for $ty {
				type Output = FilterSet;

				fn bitand(self, rhs: R) -> FilterSet {
					FilterSet::new(Combinator::And, [self.into(), rhs.into()])
				}
			}

			impl<R: Into<Filter>> BitOr<R> for $ty {
				type Output = FilterSet;

				fn bitor(self, rhs: R) -> FilterSet {
					FilterSet::new(Combinator::Or, [self.into(), rhs.into()])
				}
			}
		)*
	};
}

combine_operators!(
	Filter,
	FilterSet,
	ValuesFilter,
	NullishFilter,
	StringFilter,
	NumericFilter,
);
