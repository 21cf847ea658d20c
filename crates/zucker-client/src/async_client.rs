//! Asynchronous client

use crate::bulk::{self, Enqueued};
use crate::config::ClientConfig;
use crate::metadata::{Metadata, ServerInfo};
use crate::request::Request;
use crate::shared::ClientCore;
use crate::transport::AsyncTransport;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;
use zucker_core::{JsonMap, Result, ZuckerError};

/// Request executor used by asynchronous views and managers
///
/// Implementors provide direct execution. [`request`](AsyncClient::request)
/// routes through the bulk coordinator whenever it is awaited inside
/// [`bulk`](crate::bulk::bulk).
#[async_trait]
pub trait AsyncClient: Send + Sync {
	/// Authenticates if needed and performs the request right away
	async fn execute(&self, request: Request) -> Result<JsonMap>;

	/// Sends all requests in one `bulk` call, returning one result per request
	async fn execute_bulk(&self, batch: Vec<Request>) -> Result<Vec<Result<JsonMap>>>;

	/// Performs a request, deferring it to the active bulk session if there is one
	async fn request(&self, request: Request) -> Result<JsonMap> {
		match bulk::enqueue(request) {
			Enqueued::Queued(reply) => reply.await.map_err(|_| {
				ZuckerError::InvalidResponse("bulk session ended without a response".to_string())
			})?,
			Enqueued::Direct(request) => self.execute(request).await,
		}
	}
}

/// Asynchronous Sugar client over an [`AsyncTransport`]
#[derive(Debug)]
pub struct AsyncSugarClient<T> {
	core: ClientCore,
	transport: T,
	auth_lock: tokio::sync::Mutex<()>,
}

impl AsyncSugarClient<crate::reqwest_transport::ReqwestTransport> {
	/// Creates a client talking to the server through reqwest
	pub fn connect(config: ClientConfig) -> Result<Self> {
		let transport = crate::reqwest_transport::ReqwestTransport::new(&config)?;
		Self::with_transport(config, transport)
	}
}

impl<T: AsyncTransport> AsyncSugarClient<T> {
	pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
		Ok(Self {
			core: ClientCore::new(config)?,
			transport,
			auth_lock: tokio::sync::Mutex::new(()),
		})
	}

	pub fn config(&self) -> &ClientConfig {
		&self.core.config
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn is_authenticated(&self) -> bool {
		self.core.is_authenticated()
	}

	/// Obtains or renews the access token when required
	///
	/// Token requests are always sent directly, never as part of a bulk call.
	pub async fn authenticate(&self) -> Result<()> {
		let _guard = self.auth_lock.lock().await;
		let Some(step) = self.core.pending_authentication() else {
			return Ok(());
		};
		debug!(action = step.action, "authenticating");
		let response = self
			.transport
			.raw_request(self.core.raw_unauthenticated(step.request))
			.await?;
		self.core.finalize_authentication(step.action, response)
	}

	/// Runs the actions together, batching their requests into bulk calls
	pub async fn bulk<'a, R>(&'a self, actions: Vec<BoxFuture<'a, Result<R>>>) -> Result<Vec<R>>
	where
		R: Send + 'a,
	{
		bulk::bulk(self, actions).await
	}

	pub async fn fetch_metadata(&self, types: &[&str]) -> Result<()> {
		let fetched = self.request(Metadata::request(types)).await?;
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

#[async_trait]
impl<T: AsyncTransport> AsyncClient for AsyncSugarClient<T> {
	async fn execute(&self, request: Request) -> Result<JsonMap> {
		self.authenticate().await?;
		debug!(method = %request.method, endpoint = %request.endpoint, "sending request");
		let response = self.transport.raw_request(self.core.raw(request)).await?;
		self.core.finalize_response(response)
	}

	async fn execute_bulk(&self, batch: Vec<Request>) -> Result<Vec<Result<JsonMap>>> {
		let api_version = &self.core.config.api_version;
		let entries = batch
			.iter()
			.map(|request| request.bulk_entry(api_version))
			.collect::<Result<Vec<_>>>()?;
		let mut payload = JsonMap::new();
		payload.insert("requests".to_string(), Value::Array(entries));

		self.authenticate().await?;
		let response = self
			.transport
			.raw_request(self.core.raw(Request::post("bulk").with_json(payload)))
			.await?;
		bulk::split_response(response.into_checked_body()?, batch.len())
	}
}
