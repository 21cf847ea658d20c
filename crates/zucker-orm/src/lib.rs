//! # zucker-orm
//!
//! Typed access to SugarCRM modules.
//!
//! A [`Module`] type wraps a [`Record`] and declares its fields as typed
//! handles (see [`fields`]). Managers hand out lazy views over a module's
//! records: [`SyncManager`] / [`SyncView`] for blocking clients and
//! [`AsyncManager`] / [`AsyncView`] for async ones. Views can be filtered
//! and sliced without any I/O. The record count is fetched the first time the
//! view's window is needed, then records are loaded one offset at a time.

pub mod fields;
pub mod manager;
pub mod module;
pub mod range;
pub mod record;
pub mod view;

pub use fields::{
	BooleanField, Field, FloatField, IdField, IntegerField, LoadField, MutableField, NumericFilters,
	RelatedField, ScalarFilters, StringField,
};
pub use manager::{AsyncManager, IdCache, SyncManager};
pub use module::Module;
pub use range::{IndexRange, Slice};
pub use record::{MutationRequest, Record};
pub use view::{AsyncView, PREFETCH, SyncView};
