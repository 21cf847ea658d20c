//! Error type shared by every zucker crate

use thiserror::Error;

/// Result alias used throughout zucker
pub type Result<T> = std::result::Result<T, ZuckerError>;

/// Errors raised while building queries, talking to the server or handling records
#[derive(Debug, Error)]
pub enum ZuckerError {
	/// The server answered with a payload of an unexpected shape.
	#[error("Invalid server response: {0}")]
	InvalidResponse(String),

	/// A record lookup by key found nothing.
	#[error("Record not found: {0}")]
	NotFound(String),

	/// A positional lookup fell outside the view's window.
	#[error("Index out of range: {0}")]
	IndexOutOfRange(i64),

	/// Caller-supplied input was rejected before any request was sent.
	#[error("Validation error: {0}")]
	Validation(String),

	/// A record does not carry a value for the requested field.
	#[error("Field '{0}' is not defined on this record")]
	UndefinedField(String),

	/// The server reported an HTTP error status.
	#[error("Server error (HTTP {status}): {message}")]
	Api { status: u16, message: String },

	/// A server-side operation needs a record that has not been saved yet.
	#[error("Record has not been saved on the server")]
	UnsavedRecord,

	/// A metadata item was read before it was fetched.
	#[error("Metadata item '{0}' has not been fetched")]
	UnfetchedMetadata(String),

	/// The client configuration is incomplete or invalid.
	#[error("Configuration error: {0}")]
	Config(String),

	/// The HTTP layer failed before a response was received.
	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),

	/// A transport that is not reqwest-based failed.
	#[error("Transport error: {0}")]
	TransportFailed(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl ZuckerError {
	/// Returns true if the server answered with an HTTP error status
	pub fn is_api(&self) -> bool {
		matches!(self, ZuckerError::Api { .. })
	}

	/// Returns the HTTP status of a server error, if this is one
	pub fn status(&self) -> Option<u16> {
		match self {
			ZuckerError::Api { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns true if a lookup (by key or by position) found nothing
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			ZuckerError::NotFound(_) | ZuckerError::IndexOutOfRange(_)
		)
	}

	/// Returns true if the input was rejected locally
	pub fn is_validation(&self) -> bool {
		matches!(self, ZuckerError::Validation(_))
	}

	/// Returns true if the server sent a payload of an unexpected shape
	pub fn is_invalid_response(&self) -> bool {
		matches!(self, ZuckerError::InvalidResponse(_))
	}

	/// Returns true if the error is a timeout error
	pub fn is_timeout(&self) -> bool {
		match self {
			ZuckerError::Transport(e) => e.is_timeout(),
			_ => false,
		}
	}

	/// Returns true if the error is a connection error
	pub fn is_connect(&self) -> bool {
		match self {
			ZuckerError::Transport(e) => e.is_connect(),
			_ => false,
		}
	}
}
