//! # zucker-core
//!
//! Error and JSON types shared by the zucker crates.

pub mod error;
pub mod json;

pub use error::{Result, ZuckerError};
pub use json::JsonMap;
