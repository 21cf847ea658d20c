//! # zucker-filters
//!
//! Filter expressions for Sugar module listings.
//!
//! Single-field predicates ([`ValuesFilter`], [`NullishFilter`],
//! [`StringFilter`], [`NumericFilter`]) combine with `&` and `|` into
//! [`FilterSet`]s. Negatable predicates support `!`.
//!
//! ```
//! use zucker_filters::{GenericFilter, NullishFilter, ValuesFilter};
//! use serde_json::json;
//!
//! let filter = ValuesFilter::new("name", ["Ben"]).unwrap() & !NullishFilter::new("employer");
//! assert_eq!(
//!     serde_json::Value::Object(filter.build_filter()),
//!     json!({"$and": [
//!         {"name": {"$equals": "Ben"}},
//!         {"employer": {"$not_null": null}},
//!     ]})
//! );
//! ```

pub mod basic;
pub mod combining;
pub mod params;
pub mod types;

pub use basic::{BasicFilter, NullishFilter, NumericFilter, StringFilter, StringMatch, ValuesFilter};
pub use combining::{Filter, FilterSet};
pub use params::{render_filter_map, render_query_params};
pub use types::{Combinator, GenericFilter};
