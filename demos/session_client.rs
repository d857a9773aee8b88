//! Demonstrates the default reqwest-backed [`SessionClient`] recovering from an expired bearer
//! token: the stale request fails, a single refresh call settles a new token, and the original
//! request is replayed transparently.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use session_guard::{
	client::SessionClient,
	coordinator::Coordinator,
	http::ReqwestHttpClient,
	reqwest::Client,
	session::SessionToken,
	store::MemoryStore,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/applications").header("authorization", "Bearer stale-token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let _fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/applications").header("authorization", "Bearer fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"applications\":[{\"id\":42,\"status\":\"pending\"}]}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").header_missing("authorization");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"fresh-token\",\
				\"user\":{\"email\":\"registrar@example.edu\",\"display_name\":\"Registrar\"}}",
			);
		})
		.await;
	let store = MemoryStore::default();
	let coordinator = Arc::new(Coordinator::with_http_client(
		Arc::new(store),
		ReqwestHttpClient::with_client(Client::builder().cookie_store(true).build()?),
		Url::parse(&server.url("/auth/refresh"))?,
	));

	coordinator.establish_session(SessionToken::new("stale-token")).await?;

	let client = SessionClient::new(coordinator.clone());
	let request = http::Request::builder()
		.method(http::Method::GET)
		.uri(server.url("/applications"))
		.body(Vec::new())?;
	let response = client.execute(request).await?;

	println!("Replayed response status: {}.", response.status());
	println!("Replayed response body: {}.", String::from_utf8_lossy(response.body()));
	println!(
		"Settled token: {}.",
		coordinator
			.current_token()
			.map(|token| token.expose().to_owned())
			.unwrap_or_else(|| "<none>".into()),
	);
	println!(
		"Refresh attempts: {}, successes: {}.",
		coordinator.refresh_metrics.attempts(),
		coordinator.refresh_metrics.successes(),
	);

	refresh.assert_async().await;

	Ok(())
}
