//! OAuth state of a client
//!
//! A client starts out holding the user's credentials. The first request
//! exchanges them for an access/refresh token pair, and later requests renew
//! the pair once it is about to expire.

use crate::config::ClientConfig;
use crate::request::Request;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use zucker_core::json::{expect_object, kind_of};
use zucker_core::{Result, ZuckerError};

pub const TOKEN_ENDPOINT: &str = "oauth2/token/";

/// Where a client stands in the OAuth flow
#[derive(Clone, PartialEq, Eq)]
pub enum AuthState {
	/// No token has been obtained yet
	Credentials { username: String, password: String },
	/// Tokens from the last successful exchange
	Token {
		access_token: String,
		refresh_token: String,
		expires_at: DateTime<Utc>,
	},
}

impl std::fmt::Debug for AuthState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AuthState::Credentials { username, .. } => f
				.debug_struct("Credentials")
				.field("username", username)
				.finish_non_exhaustive(),
			AuthState::Token { expires_at, .. } => f
				.debug_struct("Token")
				.field("expires_at", expires_at)
				.finish_non_exhaustive(),
		}
	}
}

/// An authentication request that has to be performed before the next call
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStep {
	/// Human-readable name of the step, used in logs
	pub action: &'static str,
	pub request: Request,
}

impl AuthState {
	pub fn from_config(config: &ClientConfig) -> Self {
		AuthState::Credentials {
			username: config.username.clone(),
			password: config.password.clone(),
		}
	}

	pub fn is_authenticated(&self) -> bool {
		matches!(self, AuthState::Token { .. })
	}

	pub fn access_token(&self) -> Option<&str> {
		match self {
			AuthState::Token { access_token, .. } => Some(access_token),
			AuthState::Credentials { .. } => None,
		}
	}

	/// Returns the request needed to (re)authenticate, if any
	///
	/// Tokens are considered valid until `margin` before they expire.
	pub fn prepare(&self, platform: &str, margin: Duration, now: DateTime<Utc>) -> Option<AuthStep> {
		let mut form = IndexMap::new();
		form.insert("client_id".to_string(), "sugar".to_string());
		form.insert("client_secret".to_string(), String::new());

		let action = match self {
			AuthState::Token {
				refresh_token,
				expires_at,
				..
			} => {
				if *expires_at > now + margin {
					return None;
				}
				form.insert("grant_type".to_string(), "refresh_token".to_string());
				form.insert("refresh_token".to_string(), refresh_token.clone());
				"authentication token renewal"
			}
			AuthState::Credentials { username, password } => {
				form.insert("grant_type".to_string(), "password".to_string());
				form.insert("username".to_string(), username.clone());
				form.insert("password".to_string(), password.clone());
				"initial authentication"
			}
		};
		form.insert("platform".to_string(), platform.to_string());

		Some(AuthStep {
			action,
			request: Request::post(TOKEN_ENDPOINT).with_form(form),
		})
	}

	/// Stores the tokens from a token endpoint response
	pub fn finalize(&mut self, body: Value, now: DateTime<Utc>) -> Result<()> {
		let response = expect_object(body, "authentication response")?;

		let (Some(access_token), Some(refresh_token), Some(expires_in)) = (
			response.get("access_token"),
			response.get("refresh_token"),
			response.get("expires_in"),
		) else {
			return Err(ZuckerError::InvalidResponse(
				"missing response fields from authentication result".to_string(),
			));
		};

		let (Some(access_token), Some(refresh_token)) = (access_token.as_str(), refresh_token.as_str())
		else {
			return Err(ZuckerError::InvalidResponse(format!(
				"bad authentication data: expected token strings, got {} and {}",
				kind_of(access_token),
				kind_of(refresh_token)
			)));
		};

		let Some(expires_in) = expires_in.as_f64() else {
			return Err(ZuckerError::InvalidResponse(format!(
				"bad authentication data: expected expiry as a number, got {}",
				kind_of(expires_in)
			)));
		};

		*self = AuthState::Token {
			access_token: access_token.to_string(),
			refresh_token: refresh_token.to_string(),
			expires_at: now + Duration::milliseconds((expires_in * 1000.0) as i64),
		};
		Ok(())
	}
}
