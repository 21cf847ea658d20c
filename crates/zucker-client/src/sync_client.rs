//! Blocking client

use crate::config::ClientConfig;
use crate::metadata::{Metadata, ServerInfo};
use crate::request::Request;
use crate::shared::ClientCore;
use crate::transport::SyncTransport;
use tracing::debug;
use zucker_core::{JsonMap, Result};

/// Request executor used by synchronous views and managers
pub trait SyncClient: Send + Sync {
	/// Authenticates if needed, performs the request and returns the JSON body
	fn request(&self, request: Request) -> Result<JsonMap>;
}

/// Blocking Sugar client over a [`SyncTransport`]
///
/// # Examples
///
/// ```rust,no_run
/// use zucker_client::{ClientConfig, SugarClient, SyncClient, Request};
///
/// let config = ClientConfig::from_env()?;
/// let client = SugarClient::connect(config)?;
/// let contacts = client.request(Request::get("Contacts/count"))?;
/// # Ok::<(), zucker_core::ZuckerError>(())
/// ```
#[derive(Debug)]
pub struct SugarClient<T> {
	core: ClientCore,
	transport: T,
}

#[cfg(feature = "blocking")]
impl SugarClient<crate::reqwest_transport::BlockingReqwestTransport> {
	/// Creates a client talking to the server through reqwest's blocking client
	pub fn connect(config: ClientConfig) -> Result<Self> {
		let transport = crate::reqwest_transport::BlockingReqwestTransport::new(&config)?;
		Self::with_transport(config, transport)
	}
}

impl<T: SyncTransport> SugarClient<T> {
	pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
		Ok(Self {
			core: ClientCore::new(config)?,
			transport,
		})
	}

	pub fn config(&self) -> &ClientConfig {
		&self.core.config
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Whether the initial token exchange has happened
	pub fn is_authenticated(&self) -> bool {
		self.core.is_authenticated()
	}

	/// Obtains or renews the access token when required
	pub fn authenticate(&self) -> Result<()> {
		let Some(step) = self.core.pending_authentication() else {
			return Ok(());
		};
		debug!(action = step.action, "authenticating");
		let response = self
			.transport
			.raw_request(self.core.raw_unauthenticated(step.request))?;
		self.core.finalize_authentication(step.action, response)
	}

	/// Makes sure the given metadata types are cached
	pub fn fetch_metadata(&self, types: &[&str]) -> Result<()> {
		let fetched = self.request(Metadata::request(types))?;
		self.core.metadata.merge(fetched);
		Ok(())
	}

	pub fn metadata(&self) -> &Metadata {
		&self.core.metadata
	}

	pub fn server_info(&self) -> Result<ServerInfo> {
		self.core.metadata.server_info()
	}

	pub fn module_names(&self) -> Result<Vec<String>> {
		self.core.metadata.module_names()
	}

	pub fn contains_module(&self, name: &str) -> Result<bool> {
		self.core.metadata.contains_module(name)
	}
}

impl<T: SyncTransport> SyncClient for SugarClient<T> {
	fn request(&self, request: Request) -> Result<JsonMap> {
		self.authenticate()?;
		debug!(method = %request.method, endpoint = %request.endpoint, "sending request");
		let response = self.transport.raw_request(self.core.raw(request))?;
		self.core.finalize_response(response)
	}
}
