//! Client configuration
//!
//! A [`ClientConfig`] can be deserialized from any serde source, assembled
//! with [`ClientConfigBuilder`] or read from `ZUCKER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zucker_core::{Result, ZuckerError};

pub const ENV_BASE_URL: &str = "ZUCKER_BASE_URL";
pub const ENV_USERNAME: &str = "ZUCKER_USERNAME";
pub const ENV_PASSWORD: &str = "ZUCKER_PASSWORD";
pub const ENV_CLIENT_PLATFORM: &str = "ZUCKER_CLIENT_PLATFORM";
pub const ENV_VERIFY_SSL: &str = "ZUCKER_VERIFY_SSL";

fn default_client_platform() -> String {
	"zucker".to_string()
}

fn default_verify_ssl() -> bool {
	true
}

fn default_api_version() -> String {
	"v11_5".to_string()
}

fn default_token_renewal_margin() -> u64 {
	10 * 60
}

/// Connection settings for a Sugar instance
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// URL of the Sugar installation, without the `/rest/...` suffix
	pub base_url: String,
	pub username: String,
	pub password: String,
	/// OAuth platform string sent during authentication
	#[serde(default = "default_client_platform")]
	pub client_platform: String,
	/// Disable only for testing against self-signed servers
	#[serde(default = "default_verify_ssl")]
	pub verify_ssl: bool,
	/// REST API version segment, like `v11_5`
	#[serde(default = "default_api_version")]
	pub api_version: String,
	/// Request timeout in seconds
	#[serde(default)]
	pub timeout: Option<u64>,
	/// Seconds before token expiry at which the token is renewed
	#[serde(default = "default_token_renewal_margin")]
	pub token_renewal_margin: u64,
}

impl ClientConfig {
	/// Creates a validated configuration with default options
	///
	/// # Examples
	///
	/// ```
	/// use zucker_client::ClientConfig;
	///
	/// let config = ClientConfig::new("https://crm.example.com", "admin", "secret").unwrap();
	/// assert_eq!(config.client_platform, "zucker");
	/// assert!(config.verify_ssl);
	/// ```
	pub fn new(
		base_url: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Self> {
		Self::builder()
			.base_url(base_url)
			.username(username)
			.password(password)
			.build()
	}

	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Reads the configuration from `ZUCKER_*` environment variables
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through an arbitrary variable lookup
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |key: &str| {
			lookup(key).ok_or_else(|| ZuckerError::Config(format!("{key} is not set")))
		};

		let mut builder = Self::builder()
			.base_url(required(ENV_BASE_URL)?)
			.username(required(ENV_USERNAME)?)
			.password(required(ENV_PASSWORD)?);
		if let Some(platform) = lookup(ENV_CLIENT_PLATFORM) {
			builder = builder.client_platform(platform);
		}
		if let Some(verify) = lookup(ENV_VERIFY_SSL) {
			builder = builder.verify_ssl(parse_flag(ENV_VERIFY_SSL, &verify)?);
		}
		builder.build()
	}

	/// Checks that every required setting is present
	pub fn validate(&self) -> Result<()> {
		let required = [
			("base_url", &self.base_url),
			("username", &self.username),
			("password", &self.password),
			("client_platform", &self.client_platform),
			("api_version", &self.api_version),
		];
		for (name, value) in required {
			if value.is_empty() {
				return Err(ZuckerError::Config(format!(
					"all relevant parameters must be provided to create a Sugar client, {name} is empty"
				)));
			}
		}
		Ok(())
	}

	/// Full URL of a REST endpoint
	pub fn endpoint_url(&self, endpoint: &str) -> String {
		format!(
			"{}/rest/{}/{}",
			self.base_url.trim_end_matches('/'),
			self.api_version,
			endpoint
		)
	}

	pub fn timeout_duration(&self) -> Option<Duration> {
		self.timeout.map(Duration::from_secs)
	}

	pub fn renewal_margin(&self) -> chrono::Duration {
		chrono::Duration::seconds(self.token_renewal_margin as i64)
	}
}

impl fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientConfig")
			.field("base_url", &self.base_url)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("client_platform", &self.client_platform)
			.field("verify_ssl", &self.verify_ssl)
			.field("api_version", &self.api_version)
			.field("timeout", &self.timeout)
			.field("token_renewal_margin", &self.token_renewal_margin)
			.finish()
	}
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(ZuckerError::Config(format!(
			"{key} must be a boolean, got '{other}'"
		))),
	}
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
	base_url: Option<String>,
	username: Option<String>,
	password: Option<String>,
	client_platform: Option<String>,
	verify_ssl: Option<bool>,
	api_version: Option<String>,
	timeout: Option<u64>,
	token_renewal_margin: Option<u64>,
}

impl ClientConfigBuilder {
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self
	}

	pub fn password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	pub fn client_platform(mut self, platform: impl Into<String>) -> Self {
		self.client_platform = Some(platform.into());
		self
	}

	pub fn verify_ssl(mut self, verify: bool) -> Self {
		self.verify_ssl = Some(verify);
		self
	}

	pub fn api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = Some(version.into());
		self
	}

	/// Set the request timeout in seconds
	pub fn timeout(mut self, seconds: u64) -> Self {
		self.timeout = Some(seconds);
		self
	}

	/// Set how many seconds before expiry the token is renewed
	pub fn token_renewal_margin(mut self, seconds: u64) -> Self {
		self.token_renewal_margin = Some(seconds);
		self
	}

	/// Build and validate the configuration
	pub fn build(self) -> Result<ClientConfig> {
		let config = ClientConfig {
			base_url: self.base_url.unwrap_or_default(),
			username: self.username.unwrap_or_default(),
			password: self.password.unwrap_or_default(),
			client_platform: self.client_platform.unwrap_or_else(default_client_platform),
			verify_ssl: self.verify_ssl.unwrap_or_else(default_verify_ssl),
			api_version: self.api_version.unwrap_or_else(default_api_version),
			timeout: self.timeout,
			token_renewal_margin: self
				.token_renewal_margin
				.unwrap_or_else(default_token_renewal_margin),
		};
		config.validate()?;
		Ok(config)
	}
}
