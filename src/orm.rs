//! Modules, records, fields, views and managers.

pub use zucker_orm::*;
