//! Error type and JSON helpers shared by every layer.
//!
//! # Examples
//!
//! ```rust
//! use zucker::core::{Result, ZuckerError};
//!
//! fn lookup() -> Result<()> {
//!     Err(ZuckerError::NotFound("abc".to_string()))
//! }
//! assert!(lookup().unwrap_err().is_not_found());
//! ```

pub use zucker_core::*;
