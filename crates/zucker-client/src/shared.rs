//! State shared by the sync and async clients

use crate::auth::{AuthState, AuthStep};
use crate::config::ClientConfig;
use crate::metadata::Metadata;
use crate::request::{RawRequest, RawResponse, Request};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::warn;
use zucker_core::json::expect_object;
use zucker_core::{JsonMap, Result};

#[derive(Debug)]
pub(crate) struct ClientCore {
	pub(crate) config: ClientConfig,
	auth: Mutex<AuthState>,
	pub(crate) metadata: Metadata,
}

impl ClientCore {
	pub(crate) fn new(config: ClientConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self {
			auth: Mutex::new(AuthState::from_config(&config)),
			config,
			metadata: Metadata::default(),
		})
	}

	pub(crate) fn is_authenticated(&self) -> bool {
		self.auth.lock().is_authenticated()
	}

	/// Attaches URL and token to a request
	pub(crate) fn raw(&self, request: Request) -> RawRequest {
		RawRequest {
			url: self.config.endpoint_url(&request.endpoint),
			token: self.auth.lock().access_token().map(str::to_string),
			request,
		}
	}

	/// Token requests are sent without an access token
	pub(crate) fn raw_unauthenticated(&self, request: Request) -> RawRequest {
		RawRequest {
			url: self.config.endpoint_url(&request.endpoint),
			token: None,
			request,
		}
	}

	pub(crate) fn pending_authentication(&self) -> Option<AuthStep> {
		self.auth.lock().prepare(
			&self.config.client_platform,
			self.config.renewal_margin(),
			Utc::now(),
		)
	}

	pub(crate) fn finalize_authentication(&self, action: &str, response: RawResponse) -> Result<()> {
		let result = response
			.into_checked_body()
			.and_then(|body| self.auth.lock().finalize(body, Utc::now()));
		if let Err(error) = &result {
			warn!(action, %error, "authentication failed");
		}
		result
	}

	/// Checks the status and requires a JSON object body
	pub(crate) fn finalize_response(&self, response: RawResponse) -> Result<JsonMap> {
		let body = response.into_checked_body()?;
		expect_object(body, "response body").inspect_err(|error| {
			warn!(%error, "server sent an invalid response");
		})
	}
}
