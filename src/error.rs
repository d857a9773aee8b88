//! Crate-level error types shared across the coordinator, client, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// The taxonomy mirrors how failures propagate to callers:
/// - a first-time authentication failure is recovered internally and never reaches this type;
/// - [`Error::RefreshFailed`] means the refresh call itself settled with a failure, the stored
///   token has been cleared, and the consumer should treat the session as ended;
/// - [`Error::Transport`] carries unrelated network failures through untouched.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The refresh cycle settled with a failure; the stored token has been discarded.
	#[error("Session refresh failed: {reason}")]
	RefreshFailed {
		/// HTTP status code returned by the refresh endpoint, when one was received.
		status: Option<u16>,
		/// Human-readable summary of the failure.
		reason: String,
	},
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// The access token cannot be carried in an `Authorization` header.
	#[error("Access token is not a valid bearer header value.")]
	BearerHeader {
		/// Underlying header validation failure.
		#[source]
		source: http::header::InvalidHeaderValue,
	},
	/// Refresh endpoint URL cannot be parsed.
	#[error("Refresh endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "snapshot unreadable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("snapshot unreadable"));

		let source = StdError::source(&error)
			.expect("Storage errors should expose the original store error as their source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn refresh_failed_reports_status_and_reason() {
		let error = Error::RefreshFailed {
			status: Some(500),
			reason: "Refresh endpoint returned HTTP 500.".into(),
		};

		assert!(error.to_string().contains("HTTP 500"));
	}
}
