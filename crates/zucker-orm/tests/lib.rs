//! Integration tests for zucker-orm
//!
//! Views and managers run against an in-memory Sugar server holding a
//! thirteen record `Demo` collection.

pub mod common;

mod async_view;
