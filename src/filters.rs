//! Filter expressions and their query-parameter encoding.

pub use zucker_filters::*;
