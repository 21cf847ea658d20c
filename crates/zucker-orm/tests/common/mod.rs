//! Shared helpers for zucker-orm integration tests

pub mod fixtures;
pub mod modules;
