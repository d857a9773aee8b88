//! Transport primitives for coordinated API dispatch.
//!
//! The module exposes [`SessionHttpClient`] so downstream crates can integrate custom HTTP
//! stacks: the coordinator and client only ever see buffered [`ApiRequest`]/[`ApiResponse`]
//! values, which keeps failure classification (status + body inspection) and single-retry
//! replay independent of any particular client crate.

// crates.io
use http::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{_prelude::*, error::ConfigError, session::TokenSecret};

/// Buffered outbound request handed to a [`SessionHttpClient`].
pub type ApiRequest = http::Request<Vec<u8>>;
/// Buffered response returned by a [`SessionHttpClient`].
pub type ApiResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`SessionHttpClient::execute`].
pub type TransportFuture<'a, E> = Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing coordinated API requests.
///
/// The trait acts as the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single transport can be shared between the coordinator (refresh
/// calls) and any number of concurrent [`SessionClient`](crate::client::SessionClient) dispatches,
/// and the returned futures must be `Send` for the lifetime of the in-flight operation.
///
/// Responses are buffered in full before they are returned: the coordinator inspects bodies to
/// recognize application-level "token expired" signals, so streaming bodies are out of scope.
pub trait SessionHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Dispatches the request and buffers the response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Clones a buffered request so it can be replayed after a refresh cycle.
pub(crate) fn clone_request(request: &ApiRequest) -> ApiRequest {
	let mut cloned = ApiRequest::new(request.body().clone());

	*cloned.method_mut() = request.method().clone();
	*cloned.uri_mut() = request.uri().clone();
	*cloned.version_mut() = request.version();
	*cloned.headers_mut() = request.headers().clone();

	cloned
}

/// Replaces the request's `Authorization` header with a bearer credential.
///
/// The header value is marked sensitive so transports that honor the flag keep it out of logs,
/// matching the redaction stance of [`TokenSecret`].
pub(crate) fn set_bearer(request: &mut ApiRequest, token: &TokenSecret) -> Result<()> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
		.map_err(|source| ConfigError::BearerHeader { source })?;

	value.set_sensitive(true);
	request.headers_mut().insert(AUTHORIZATION, value);

	Ok(())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client enables a cookie store: the refresh endpoint identifies the user through a
/// same-site session cookie rather than the (presumed invalid) access token, so the cookie issued
/// at login must survive across requests. Custom clients should do the same.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with the crate's defaults (cookie store enabled).
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl SessionHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut buffered = ApiResponse::new(response.bytes().await?.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn clone_request_preserves_all_parts() {
		let request = http::Request::builder()
			.method(http::Method::POST)
			.uri("https://api.example.edu/admissions")
			.header("content-type", "application/json")
			.body(b"{\"faculty\":\"engineering\"}".to_vec())
			.expect("Request fixture should build successfully.");
		let cloned = clone_request(&request);

		assert_eq!(cloned.method(), request.method());
		assert_eq!(cloned.uri(), request.uri());
		assert_eq!(cloned.headers(), request.headers());
		assert_eq!(cloned.body(), request.body());
	}

	#[test]
	fn set_bearer_replaces_existing_credential() {
		let mut request = http::Request::builder()
			.uri("https://api.example.edu/faculties")
			.header(AUTHORIZATION, "Bearer stale")
			.body(Vec::new())
			.expect("Request fixture should build successfully.");

		set_bearer(&mut request, &TokenSecret::new("fresh"))
			.expect("Bearer header should accept a plain ASCII token.");

		let header = request
			.headers()
			.get(AUTHORIZATION)
			.expect("Authorization header should be present after set_bearer.");

		assert_eq!(header.to_str().expect("Header should be ASCII."), "Bearer fresh");
		assert!(header.is_sensitive());
		assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
	}
}
