//! Transport seams
//!
//! Clients own authentication, URL building and error mapping. Transports only
//! move a [`RawRequest`] over the wire and hand back the decoded body, which
//! keeps clients testable against in-memory fakes.

use crate::request::{RawRequest, RawResponse};
use async_trait::async_trait;
use zucker_core::Result;

/// Blocking transport used by [`SugarClient`](crate::SugarClient)
pub trait SyncTransport: Send + Sync {
	fn raw_request(&self, request: RawRequest) -> Result<RawResponse>;
}

/// Asynchronous transport used by [`AsyncSugarClient`](crate::AsyncSugarClient)
#[async_trait]
pub trait AsyncTransport: Send + Sync {
	async fn raw_request(&self, request: RawRequest) -> Result<RawResponse>;
}
