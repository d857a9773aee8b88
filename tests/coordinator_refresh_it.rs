#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
// self
use session_guard::error::Error;

fn protected_request(server: &MockServer) -> session_guard::http::ApiRequest {
	http::Request::builder()
		.method(http::Method::GET)
		.uri(server.url("/admissions"))
		.body(Vec::new())
		.expect("Request fixture should build successfully.")
}

#[tokio::test]
async fn concurrent_failures_share_one_refresh_call() {
	let server = MockServer::start_async().await;
	let (client, coordinator, _) = common::build_reqwest_test_client(&server.url("/auth/refresh"));

	common::seed_session(&coordinator, "stale").await;

	let _stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/admissions").header("authorization", "Bearer stale");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/admissions").header("authorization", "Bearer access-new");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"admissions\":[]}");
		})
		.await;
	// The delay keeps the cycle in flight long enough for the second caller to queue on it.
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\"}")
				.delay(Duration::from_millis(250));
		})
		.await;
	let (first, second) = tokio::join!(
		client.execute(protected_request(&server)),
		client.execute(protected_request(&server)),
	);
	let first = first.expect("First request should recover through the shared refresh.");
	let second = second.expect("Second request should recover through the shared refresh.");

	assert_eq!(first.status(), 200);
	assert_eq!(second.status(), 200);

	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(2).await;

	assert_eq!(
		coordinator.current_token().map(|token| token.expose().to_owned()),
		Some("access-new".to_owned()),
	);
}

#[tokio::test]
async fn failed_refresh_rejects_all_waiters_and_clears_the_store() {
	let server = MockServer::start_async().await;
	let (client, coordinator, store) =
		common::build_reqwest_test_client(&server.url("/auth/refresh"));

	common::seed_session(&coordinator, "stale").await;

	let _protected = server
		.mock_async(|when, then| {
			when.method(GET).path("/admissions");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"message\":\"identity provider offline\"}")
				.delay(Duration::from_millis(250));
		})
		.await;
	let (first, second) = tokio::join!(
		client.execute(protected_request(&server)),
		client.execute(protected_request(&server)),
	);
	let first = first.expect_err("A failed refresh cycle should reject the refreshing caller.");
	let second = second.expect_err("A failed refresh cycle should reject queued waiters.");

	for error in [&first, &second] {
		assert!(
			matches!(error, Error::RefreshFailed { status: Some(500), .. }),
			"Unexpected error: {error:?}",
		);
	}

	refresh.assert_calls_async(1).await;

	assert!(coordinator.current_token().is_none());
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn refresh_success_persists_token_and_profile() {
	let server = MockServer::start_async().await;
	let (client, coordinator, store) =
		common::build_reqwest_test_client(&server.url("/auth/refresh"));

	common::seed_session(&coordinator, "stale").await;

	let _stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/admissions").header("authorization", "Bearer stale");
			then.status(401).body("");
		})
		.await;
	let _fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/admissions").header("authorization", "Bearer access-new");
			then.status(200).body("{}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-new\",\
					\"user\":{\"email\":\"registrar@example.edu\",\"display_name\":\"Registrar\"}}",
				);
		})
		.await;
	let response = client
		.execute(protected_request(&server))
		.await
		.expect("The request should recover after a successful refresh.");

	assert_eq!(response.status(), 200);

	refresh.assert_calls_async(1).await;

	let persisted = store.snapshot().expect("Store should hold the settled token.");

	assert_eq!(persisted.access_token.expose(), "access-new");
	assert_eq!(
		persisted.profile.as_ref().and_then(|profile| profile.display_name.as_deref()),
		Some("Registrar"),
	);
	assert_eq!(coordinator.refresh_metrics.successes(), 1);
}
