//! Shared fixtures for reqwest-backed integration tests.

// std
use std::sync::Arc;
// self
use session_guard::{
	client::SessionClient,
	coordinator::Coordinator,
	http::ReqwestHttpClient,
	reqwest,
	session::SessionToken,
	store::MemoryStore,
	url::Url,
};

pub type TestClient = SessionClient<ReqwestHttpClient>;
pub type TestCoordinator = Arc<Coordinator<ReqwestHttpClient>>;

/// Builds a client/coordinator pair against the provided refresh endpoint, backed by an
/// in-memory store and a cookie-enabled reqwest transport that accepts `httpmock`'s
/// self-signed certificates.
pub fn build_reqwest_test_client(refresh_url: &str) -> (TestClient, TestCoordinator, MemoryStore) {
	let store = MemoryStore::default();
	let refresh_endpoint =
		Url::parse(refresh_url).expect("Refresh endpoint fixture should parse.");
	let client = reqwest::Client::builder()
		.cookie_store(true)
		.danger_accept_invalid_certs(true)
		.build()
		.expect("Failed to build insecure reqwest client for tests.");
	let coordinator = Arc::new(Coordinator::with_http_client(
		Arc::new(store.clone()),
		ReqwestHttpClient::with_client(client),
		refresh_endpoint,
	));

	(SessionClient::new(coordinator.clone()), coordinator, store)
}

/// Installs a known access token so the first dispatch carries a stale credential.
pub async fn seed_session(coordinator: &TestCoordinator, token: &str) {
	coordinator
		.establish_session(SessionToken::new(token))
		.await
		.expect("Session establishment should succeed with a memory store.");
}
