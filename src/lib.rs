//! # Zucker
//!
//! Typed object-relational client mapping for the SugarCRM REST API.
//!
//! Module types wrap a [`Record`] and declare typed field handles. Managers
//! hand out lazy views over a module's records, which can be filtered and
//! sliced without talking to the server. Records are fetched one offset at a
//! time when a view is indexed or iterated. Async views batch the requests of
//! concurrent lookups into `bulk` calls.
//!
//! ## Feature Flags
//!
//! - `blocking` (default) - blocking transport on top of reqwest's blocking client
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zucker::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Lead(Record);
//!
//! impl Lead {
//!     const LAST_NAME: StringField = StringField::new("last_name");
//!     const ACCOUNT: StringField = StringField::new("account_name");
//! }
//!
//! impl Module for Lead {
//!     const API_NAME: &'static str = "Leads";
//!
//!     fn declared_fields() -> &'static [&'static str] {
//!         &["last_name", "account_name"]
//!     }
//!     fn from_record(record: Record) -> Self { Lead(record) }
//!     fn record(&self) -> &Record { &self.0 }
//!     fn record_mut(&mut self) -> &mut Record { &mut self.0 }
//! }
//!
//! let client = Arc::new(SugarClient::connect(ClientConfig::from_env()?)?);
//! let leads = SyncManager::<Lead, _>::new(client);
//!
//! let smiths = leads.find([Lead::LAST_NAME.eq("Smith".to_string())?])?;
//! for lead in smiths.slice(..20)?.iter()? {
//!     let lead = lead?;
//!     println!("{} works at {}", lead.record(), Lead::ACCOUNT.get(&lead)?);
//! }
//! # Ok::<(), ZuckerError>(())
//! ```

pub mod client;
pub mod core;
pub mod filters;
pub mod orm;

// Re-export error handling
pub use zucker_core::{JsonMap, Result, ZuckerError};

// Re-export clients
#[cfg(feature = "blocking")]
pub use zucker_client::BlockingReqwestTransport;
pub use zucker_client::{
	AsyncClient, AsyncSugarClient, ClientConfig, ClientConfigBuilder, ReqwestTransport,
	SugarClient, SyncClient, bulk,
};

// Re-export filters
pub use zucker_filters::{Filter, FilterSet, GenericFilter};

// Re-export ORM
pub use zucker_orm::{
	AsyncManager, AsyncView, BooleanField, FloatField, IdField, IntegerField, Module, Record,
	RelatedField, Slice, StringField, SyncManager, SyncView,
};

/// Prelude module for convenient imports
///
/// Brings the error type, clients, managers, views and field traits into
/// scope.
pub mod prelude {
	pub use crate::{
		AsyncClient, AsyncManager, AsyncSugarClient, AsyncView, BooleanField, ClientConfig, Filter,
		FilterSet, FloatField, IdField, IntegerField, JsonMap, Module, Record, RelatedField,
		Result, Slice, StringField, SugarClient, SyncClient, SyncManager, SyncView, ZuckerError,
		bulk,
	};
	pub use zucker_orm::{Field, LoadField, MutableField, NumericFilters, ScalarFilters};
}
