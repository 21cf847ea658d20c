//! Shared filter vocabulary

use std::fmt;
use zucker_core::JsonMap;

/// Anything that renders to a Sugar filter expression
pub trait GenericFilter {
	/// Render this filter into the JSON form understood by the server
	fn build_filter(&self) -> JsonMap;
}

/// How the parts of a [`FilterSet`](crate::FilterSet) are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
	/// All parts must match
	And,
	/// At least one part must match
	Or,
}

impl Combinator {
	/// The operator key used on the wire
	pub fn key(self) -> &'static str {
		match self {
			Combinator::And => "$and",
			Combinator::Or => "$or",
		}
	}
}

impl fmt::Display for Combinator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}
