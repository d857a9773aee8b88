//! Session token coordination: process-wide session state, bearer authorization, and
//! single-flight refresh.

pub mod failure;
pub mod refresh;

mod metrics;

pub use failure::{FailureDisposition, RequestAttempt};
pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	coordinator::refresh::Settlement,
	http::{ApiRequest, ApiResponse, SessionHttpClient, set_bearer},
	session::{SessionToken, TokenSecret},
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Default application-level "token expired" marker matched against error response bodies.
pub const DEFAULT_EXPIRY_MARKER: &str = "jwt expired";

#[derive(Debug, Default)]
pub(crate) struct SessionState {
	/// Token attached to outbound requests; absent before login and after a failed refresh.
	pub token: Option<SessionToken>,
	/// Settlement cycle counter; incremented exactly once per settled refresh.
	pub cycle: u64,
	/// Outcome of the most recent settled cycle, shared with coalesced waiters.
	pub last_settlement: Option<Settlement>,
}

/// Coordinates bearer authorization and single-flight token refresh for one session.
///
/// The coordinator is the sole writer of the stored token and the refresh cycle state, so a
/// process needs exactly one instance per logical session (wrap it in an [`Arc`] and share it
/// with every request path). Tests construct isolated instances with an in-memory store.
pub struct Coordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// HTTP client used for refresh calls; [`SessionClient`](crate::client::SessionClient)
	/// shares it for regular dispatch.
	pub http_client: Arc<C>,
	/// Store that persists the session token across restarts.
	pub store: Arc<dyn SessionStore>,
	/// Shared metrics recorder for refresh cycle outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) refresh_endpoint: Url,
	pub(crate) expiry_marker: String,
	pub(crate) state: RwLock<SessionState>,
	pub(crate) refresh_gate: AsyncMutex<()>,
}
impl<C> Coordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a coordinator that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		http_client: impl Into<Arc<C>>,
		refresh_endpoint: Url,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			refresh_metrics: Default::default(),
			refresh_endpoint,
			expiry_marker: DEFAULT_EXPIRY_MARKER.into(),
			state: Default::default(),
			refresh_gate: AsyncMutex::new(()),
		}
	}

	/// Overrides the application-level "token expired" marker (matched case-insensitively
	/// against error response bodies).
	pub fn with_expiry_marker(mut self, marker: impl Into<String>) -> Self {
		self.expiry_marker = marker.into().to_ascii_lowercase();

		self
	}

	/// Loads a persisted token from the store into the live session state.
	///
	/// Intended to run once at startup, before the first coordinated request.
	pub async fn bootstrap(&self) -> Result<Option<SessionToken>> {
		let token = self.store.load().await?;

		if let Some(token) = token.clone() {
			self.state.write().token = Some(token);
		}

		Ok(token)
	}

	/// Installs a token obtained outside the refresh path (login) and persists it.
	pub async fn establish_session(&self, token: SessionToken) -> Result<()> {
		self.state.write().token = Some(token.clone());
		self.store.save(token).await?;

		Ok(())
	}

	/// Ends the session: discards the live token and clears the store.
	pub async fn clear_session(&self) -> Result<()> {
		self.state.write().token = None;
		self.store.clear().await?;

		Ok(())
	}

	/// Returns the currently held access token, if any.
	pub fn current_token(&self) -> Option<TokenSecret> {
		self.state.read().token.as_ref().map(|token| token.access_token.clone())
	}

	/// Returns the full session token currently held, if any.
	pub fn current_session(&self) -> Option<SessionToken> {
		self.state.read().token.clone()
	}

	/// Returns the settlement cycle counter.
	///
	/// Capture the value before dispatching a request and pass it to
	/// [`handle_failure`](Self::handle_failure): a cycle that settled in between is reused
	/// instead of triggering a second refresh.
	pub fn cycle(&self) -> u64 {
		self.state.read().cycle
	}

	/// Attaches the current access token as a bearer credential.
	///
	/// No-op when no token is held or when the request targets the refresh endpoint (which
	/// authenticates through the session cookie instead). Synchronous; never awaits.
	pub fn authorize(&self, request: &mut ApiRequest) -> Result<()> {
		if self.is_refresh_request(request) {
			return Ok(());
		}

		match self.current_token() {
			Some(token) => set_bearer(request, &token),
			None => Ok(()),
		}
	}

	/// Classifies a completed response and decides how the caller should proceed.
	///
	/// Returns [`FailureDisposition::Surface`] when the response is not an authentication
	/// failure, when the failing request is the refresh call itself, or when the request was
	/// already retried once. Otherwise joins (or starts) a refresh cycle and, on success,
	/// returns [`FailureDisposition::Retry`] carrying the settled token. A failed cycle
	/// propagates [`Error::RefreshFailed`] after clearing the stored token.
	pub async fn handle_failure(
		&self,
		request: &ApiRequest,
		response: &ApiResponse,
		attempt: RequestAttempt,
		observed_cycle: u64,
	) -> Result<FailureDisposition> {
		if !failure::is_auth_failure(response, &self.expiry_marker) {
			return Ok(FailureDisposition::Surface);
		}
		if self.is_refresh_request(request) || matches!(attempt, RequestAttempt::Retried) {
			return Ok(FailureDisposition::Surface);
		}

		let token = self.refresh_session(observed_cycle).await?;

		Ok(FailureDisposition::Retry(token))
	}

	pub(crate) fn is_refresh_request(&self, request: &ApiRequest) -> bool {
		match Url::parse(&request.uri().to_string()) {
			Ok(url) => url == self.refresh_endpoint,
			// Relative request URIs carry no authority; fall back to the path.
			Err(_) => request.uri().path() == self.refresh_endpoint.path(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Coordinator<ReqwestHttpClient> {
	/// Creates a new coordinator backed by the crate's default reqwest transport.
	///
	/// The transport enables a cookie store so the same-site refresh credential issued at
	/// login survives across requests.
	pub fn new(store: Arc<dyn SessionStore>, refresh_endpoint: Url) -> Result<Self> {
		Ok(Self::with_http_client(store, ReqwestHttpClient::new()?, refresh_endpoint))
	}
}
impl<C> Debug for Coordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("Coordinator")
			.field("refresh_endpoint", &self.refresh_endpoint.as_str())
			.field("expiry_marker", &self.expiry_marker)
			.field("token_held", &state.token.is_some())
			.field("cycle", &state.cycle)
			.finish()
	}
}
