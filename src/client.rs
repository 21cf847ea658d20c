//! Configuration, authentication and transports for the REST API.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zucker::client::{AsyncSugarClient, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://crm.example.com")
//!     .username("admin")
//!     .password("secret")
//!     .build()?;
//! let client = AsyncSugarClient::connect(config)?;
//! # Ok::<(), zucker::core::ZuckerError>(())
//! ```

pub use zucker_client::*;
