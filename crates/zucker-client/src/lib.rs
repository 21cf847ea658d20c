//! # zucker-client
//!
//! Clients for the SugarCRM REST API.
//!
//! [`SugarClient`] blocks on every call while [`AsyncSugarClient`] is driven
//! by an async runtime and can batch concurrent requests through [`bulk`].
//! Both authenticate lazily with OAuth and renew their token before it
//! expires. The wire is abstracted behind [`SyncTransport`] and
//! [`AsyncTransport`], with reqwest implementations provided.

pub mod async_client;
pub mod auth;
pub mod bulk;
pub mod config;
pub mod metadata;
pub mod request;
pub mod reqwest_transport;
mod shared;
pub mod sync_client;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use async_client::{AsyncClient, AsyncSugarClient};
pub use auth::{AuthState, AuthStep};
pub use bulk::bulk;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use metadata::{Metadata, ServerInfo};
pub use request::{RawRequest, RawResponse, Request};
#[cfg(feature = "blocking")]
pub use reqwest_transport::BlockingReqwestTransport;
pub use reqwest_transport::ReqwestTransport;
pub use sync_client::{SugarClient, SyncClient};
pub use transport::{AsyncTransport, SyncTransport};

pub use http::Method;
