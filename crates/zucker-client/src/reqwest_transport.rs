//! reqwest-backed transports

use crate::config::ClientConfig;
use crate::request::{RawRequest, RawResponse};
use crate::transport::AsyncTransport;
use async_trait::async_trait;
use serde_json::Value;
use zucker_core::{Result, ZuckerError};

const OAUTH_TOKEN_HEADER: &str = "OAuth-Token";

fn decode_body(bytes: &[u8]) -> Result<Value> {
	if bytes.is_empty() {
		return Ok(Value::Null);
	}
	serde_json::from_slice(bytes)
		.map_err(|e| ZuckerError::InvalidResponse(format!("response body is not valid JSON: {e}")))
}

fn pairs(map: &indexmap::IndexMap<String, String>) -> Vec<(&str, &str)> {
	map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Asynchronous transport on top of [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	/// Builds a transport honouring the TLS and timeout settings of `config`
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(!config.verify_ssl);
		if let Some(timeout) = config.timeout_duration() {
			builder = builder.timeout(timeout);
		}
		Ok(Self {
			client: builder.build()?,
		})
	}

	/// Wraps an already configured reqwest client
	pub fn from_client(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
	async fn raw_request(&self, raw: RawRequest) -> Result<RawResponse> {
		let request = &raw.request;
		let mut builder = self
			.client
			.request(request.method.clone(), &raw.url)
			.header("Cache-Control", "no-cache");
		if let Some(token) = &raw.token {
			builder = builder.header(OAUTH_TOKEN_HEADER, token);
		}
		if !request.params.is_empty() {
			builder = builder.query(&pairs(&request.params));
		}
		if let Some(form) = &request.form {
			builder = builder.form(&pairs(form));
		}
		if let Some(json) = &request.json {
			builder = builder.json(json);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let bytes = response.bytes().await?;
		Ok(RawResponse::new(status, decode_body(&bytes)?))
	}
}

#[cfg(feature = "blocking")]
pub use blocking::BlockingReqwestTransport;

#[cfg(feature = "blocking")]
mod blocking {
	use super::*;
	use crate::transport::SyncTransport;

	/// Blocking transport on top of [`reqwest::blocking::Client`]
	///
	/// Must not be used from within an async runtime.
	#[derive(Debug, Clone)]
	pub struct BlockingReqwestTransport {
		client: reqwest::blocking::Client,
	}

	impl BlockingReqwestTransport {
		pub fn new(config: &ClientConfig) -> Result<Self> {
			let mut builder =
				reqwest::blocking::Client::builder().danger_accept_invalid_certs(!config.verify_ssl);
			if let Some(timeout) = config.timeout_duration() {
				builder = builder.timeout(timeout);
			}
			Ok(Self {
				client: builder.build()?,
			})
		}
	}

	impl SyncTransport for BlockingReqwestTransport {
		fn raw_request(&self, raw: RawRequest) -> Result<RawResponse> {
			let request = &raw.request;
			let mut builder = self
				.client
				.request(request.method.clone(), &raw.url)
				.header("Cache-Control", "no-cache");
			if let Some(token) = &raw.token {
				builder = builder.header(OAUTH_TOKEN_HEADER, token);
			}
			if !request.params.is_empty() {
				builder = builder.query(&pairs(&request.params));
			}
			if let Some(form) = &request.form {
				builder = builder.form(&pairs(form));
			}
			if let Some(json) = &request.json {
				builder = builder.json(json);
			}

			let response = builder.send()?;
			let status = response.status().as_u16();
			let bytes = response.bytes()?;
			Ok(RawResponse::new(status, decode_body(&bytes)?))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_empty_body_decodes_to_null() {
		assert_eq!(decode_body(b"").unwrap(), Value::Null);
	}

	#[rstest]
	fn test_non_json_body_is_invalid_response() {
		let error = decode_body(b"<html>").unwrap_err();

		assert!(error.is_invalid_response());
	}

	#[rstest]
	fn test_transport_builds_from_config() {
		let config = ClientConfig::builder()
			.base_url("https://crm.example.com")
			.username("admin")
			.password("secret")
			.timeout(5)
			.build()
			.unwrap();

		assert!(ReqwestTransport::new(&config).is_ok());
	}
}
