//! Authentication-failure classification and the dispositions handed back to callers.

// self
use crate::{http::ApiResponse, session::TokenSecret};

/// Marks whether a request already went through a refresh-and-replay round.
///
/// The marker is what bounds recovery: a request is retried at most once per refresh cycle, so a
/// second authentication failure surfaces unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestAttempt {
	/// First dispatch of the request.
	First,
	/// The request was already replayed once after a refresh.
	Retried,
}

/// Decision returned by [`Coordinator::handle_failure`](crate::coordinator::Coordinator::handle_failure).
#[derive(Clone, Debug)]
pub enum FailureDisposition {
	/// The response is final; hand it to the caller unchanged.
	Surface,
	/// A refresh cycle settled successfully; replay the request once with this token.
	Retry(TokenSecret),
}

/// Returns `true` when the response signals an authentication failure.
///
/// Either HTTP 401, or an error-status response whose body contains `marker` (already
/// lowercased) as a case-insensitive substring. Success responses are never inspected, so the
/// marker appearing in regular payloads cannot trigger a refresh.
pub(crate) fn is_auth_failure(response: &ApiResponse, marker: &str) -> bool {
	let status = response.status();

	if status == http::StatusCode::UNAUTHORIZED {
		return true;
	}
	if !(status.is_client_error() || status.is_server_error()) {
		return false;
	}

	body_contains_marker(response.body(), marker)
}

fn body_contains_marker(body: &[u8], marker: &str) -> bool {
	if marker.is_empty() {
		return false;
	}

	let Ok(text) = std::str::from_utf8(body) else {
		return false;
	};

	text.to_ascii_lowercase().contains(marker)
}
