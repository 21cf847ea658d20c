//! Lazy views over module listings
//!
//! A view is identified by its module, its base endpoint and its filter. It
//! keeps a window of server offsets that is only computed once the record
//! count is needed. Two flavors share the same addressing and caching:
//! [`SyncView`] for blocking clients and [`AsyncView`] for async ones.

mod asynchronous;
mod state;
mod sync;

pub use asynchronous::{AsyncView, PREFETCH};
pub use sync::{Iter, SyncView};
