//! In-memory Sugar server for tests
//!
//! [`FakeSugar`] implements both transport traits. It answers token requests
//! itself, unpacks `bulk` calls into their individual requests and hands every
//! other request to a user-supplied handler. All physical requests are logged
//! for assertions.

use crate::auth::TOKEN_ENDPOINT;
use crate::config::ClientConfig;
use crate::request::{RawRequest, RawResponse, Request};
use crate::transport::{AsyncTransport, SyncTransport};
use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use serde_json::{Value, json};
use zucker_core::{JsonMap, Result, ZuckerError};

type Handler = dyn Fn(&Request) -> RawResponse + Send + Sync;

/// Configuration pointing at a server that does not exist
pub fn test_config() -> ClientConfig {
	ClientConfig::builder()
		.base_url("http://sugar.test")
		.username("admin")
		.password("secret")
		.build()
		.expect("test configuration is valid")
}

/// Unwraps a `json!` object literal
pub fn json_map(value: Value) -> JsonMap {
	match value {
		Value::Object(map) => map,
		other => panic!("expected a JSON object, got {other}"),
	}
}

/// Scriptable fake server
pub struct FakeSugar {
	handler: Box<Handler>,
	bulk_override: Option<Value>,
	fail_auth: bool,
	token_lifetime: i64,
	log: Mutex<Vec<RawRequest>>,
}

impl FakeSugar {
	pub fn new<F>(handler: F) -> Self
	where
		F: Fn(&Request) -> RawResponse + Send + Sync + 'static,
	{
		Self {
			handler: Box::new(handler),
			bulk_override: None,
			fail_auth: false,
			token_lifetime: 3600,
			log: Mutex::new(Vec::new()),
		}
	}

	/// Answer every bulk call with `body` instead of dispatching its requests
	pub fn with_bulk_response(mut self, body: Value) -> Self {
		self.bulk_override = Some(body);
		self
	}

	/// Reject every token request with HTTP 401
	pub fn with_failing_auth(mut self) -> Self {
		self.fail_auth = true;
		self
	}

	/// Lifetime in seconds of issued tokens
	pub fn with_token_lifetime(mut self, seconds: i64) -> Self {
		self.token_lifetime = seconds;
		self
	}

	/// Every physical request received so far
	pub fn requests(&self) -> Vec<RawRequest> {
		self.log.lock().clone()
	}

	/// Endpoints of every physical request received so far
	pub fn endpoints(&self) -> Vec<String> {
		self.log
			.lock()
			.iter()
			.map(|raw| raw.request.endpoint.clone())
			.collect()
	}

	/// Number of physical requests sent to `endpoint`
	pub fn count(&self, endpoint: &str) -> usize {
		self.log
			.lock()
			.iter()
			.filter(|raw| raw.request.endpoint == endpoint)
			.count()
	}

	/// Requests bundled in each bulk call, in arrival order
	pub fn bulk_batches(&self) -> Vec<Vec<Request>> {
		self.log
			.lock()
			.iter()
			.filter(|raw| raw.request.endpoint == "bulk")
			.map(|raw| bulk_entries(&raw.request).unwrap_or_default())
			.collect()
	}

	/// Forget all logged requests
	pub fn clear(&self) {
		self.log.lock().clear();
	}

	fn respond(&self, raw: RawRequest) -> Result<RawResponse> {
		self.log.lock().push(raw.clone());
		let request = &raw.request;

		if request.endpoint == TOKEN_ENDPOINT {
			if self.fail_auth {
				return Ok(RawResponse::new(
					401,
					json!({"error": "invalid_grant", "error_message": "Invalid credentials"}),
				));
			}
			let issued = self.count(TOKEN_ENDPOINT);
			return Ok(RawResponse::ok(json!({
				"access_token": format!("access-{issued}"),
				"refresh_token": format!("refresh-{issued}"),
				"expires_in": self.token_lifetime,
			})));
		}

		if request.endpoint == "bulk" {
			if let Some(body) = &self.bulk_override {
				return Ok(RawResponse::ok(body.clone()));
			}
			let responses = bulk_entries(request)?
				.iter()
				.map(|inner| {
					let response = (self.handler)(inner);
					json!({"status": response.status, "contents": response.body})
				})
				.collect();
			return Ok(RawResponse::ok(Value::Array(responses)));
		}

		Ok((self.handler)(request))
	}
}

impl SyncTransport for FakeSugar {
	fn raw_request(&self, request: RawRequest) -> Result<RawResponse> {
		self.respond(request)
	}
}

#[async_trait]
impl AsyncTransport for FakeSugar {
	async fn raw_request(&self, request: RawRequest) -> Result<RawResponse> {
		tokio::task::yield_now().await;
		self.respond(request)
	}
}

fn bulk_entries(request: &Request) -> Result<Vec<Request>> {
	request
		.json
		.as_ref()
		.and_then(|body| body.get("requests"))
		.and_then(Value::as_array)
		.ok_or_else(|| ZuckerError::Validation("bulk payload has no requests".to_string()))?
		.iter()
		.map(decode_bulk_entry)
		.collect()
}

/// Turns a bulk payload entry back into a [`Request`]
pub fn decode_bulk_entry(entry: &Value) -> Result<Request> {
	let invalid = |what: &str| ZuckerError::Validation(format!("bad bulk entry: {what}"));

	let url = entry.get("url").and_then(Value::as_str).ok_or_else(|| invalid("url"))?;
	let (_version, path) = url
		.trim_start_matches('/')
		.split_once('/')
		.ok_or_else(|| invalid("url has no version"))?;
	let (endpoint, query) = path.split_once('?').unwrap_or((path, ""));

	let method = entry
		.get("method")
		.and_then(Value::as_str)
		.ok_or_else(|| invalid("method"))?;
	let method = Method::from_bytes(method.as_bytes()).map_err(|_| invalid("method"))?;

	let params: Vec<(String, String)> =
		serde_urlencoded::from_str(query).map_err(|_| invalid("query"))?;
	let mut request = Request::new(method, endpoint).with_params(params.into_iter().collect());
	if let Some(data) = entry.get("data").and_then(Value::as_str) {
		request = request.with_json(serde_json::from_str(data)?);
	}
	Ok(request)
}
