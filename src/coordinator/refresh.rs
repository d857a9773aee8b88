//! Single-flight refresh cycles with exactly-once fan-out to waiters.
//!
//! Every caller that observes an authentication failure captures the settlement cycle counter
//! first and then queues on the refresh gate. The first caller through performs exactly one
//! refresh call; everyone whose observed cycle is stale by the time it holds the gate reuses the
//! recorded settlement instead. A cycle settles once — success stores the new token (state and
//! store), failure discards both — and all waiters of that cycle observe the identical outcome.
//! A caller arriving after settlement still sees its own cycle and starts a new one.

// self
use crate::{
	_prelude::*,
	coordinator::Coordinator,
	http::SessionHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::{SessionToken, TokenSecret, UserProfile},
};

/// Outcome of a settled refresh cycle, recorded for coalesced waiters.
#[derive(Clone, Debug)]
pub(crate) enum Settlement {
	/// The cycle produced a new token.
	Success(SessionToken),
	/// The cycle failed; the failure is cloned into every waiter's error.
	Failure(RefreshFailure),
}

/// Cloneable description of a failed refresh call.
#[derive(Clone, Debug)]
pub(crate) struct RefreshFailure {
	status: Option<u16>,
	reason: String,
}
impl RefreshFailure {
	fn new(status: Option<u16>, reason: impl Into<String>) -> Self {
		Self { status, reason: reason.into() }
	}

	fn into_error(self) -> Error {
		Error::RefreshFailed { status: self.status, reason: self.reason }
	}
}

#[derive(Deserialize)]
struct RefreshResponse {
	#[serde(default)]
	access_token: String,
	#[serde(default)]
	user: Option<UserProfile>,
}

impl<C> Coordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Forces a refresh cycle outside the failure path (e.g. proactively at startup).
	///
	/// Joins an in-flight cycle when one exists, exactly like a queued authentication failure.
	pub async fn refresh_now(&self) -> Result<TokenSecret> {
		let observed_cycle = self.cycle();

		self.refresh_session(observed_cycle).await
	}

	/// Joins or starts the refresh cycle for a failure observed at `observed_cycle`.
	pub(crate) async fn refresh_session(&self, observed_cycle: u64) -> Result<TokenSecret> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh_session");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_gate.lock().await;

				if let Some(outcome) = self.settled_outcome(observed_cycle) {
					self.refresh_metrics.record_coalesced();

					return outcome;
				}

				match self.call_refresh_endpoint().await {
					Ok(token) => {
						let secret = token.access_token.clone();

						self.settle(Settlement::Success(token.clone()));
						// Snapshot persistence is best-effort: every waiter of this cycle must
						// observe the same outcome, and the in-memory session is already usable.
						let _ = self.store.save(token).await;
						self.refresh_metrics.record_success();

						Ok(secret)
					},
					Err(failure) => {
						self.settle(Settlement::Failure(failure.clone()));

						let _ = self.store.clear().await;

						self.refresh_metrics.record_failure();

						Err(failure.into_error())
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Returns the recorded outcome when a cycle settled after `observed_cycle` was captured.
	fn settled_outcome(&self, observed_cycle: u64) -> Option<Result<TokenSecret>> {
		let state = self.state.read();

		if state.cycle == observed_cycle {
			return None;
		}

		match &state.last_settlement {
			Some(Settlement::Success(token)) => Some(Ok(token.access_token.clone())),
			Some(Settlement::Failure(failure)) => Some(Err(failure.clone().into_error())),
			None => None,
		}
	}

	/// Records a settlement: the cycle counter, the recorded outcome, and the live token all
	/// move in one write, so a waiter can never observe a settled cycle without its outcome.
	fn settle(&self, settlement: Settlement) {
		let mut state = self.state.write();

		state.cycle += 1;
		state.token = match &settlement {
			Settlement::Success(token) => Some(token.clone()),
			Settlement::Failure(_) => None,
		};
		state.last_settlement = Some(settlement);
	}

	/// Issues the one refresh call of a cycle.
	///
	/// The request bypasses [`authorize`](Coordinator::authorize) on purpose: the access token
	/// is presumed invalid, and the same-site session cookie carries the credential instead.
	/// Every failure mode folds into [`RefreshFailure`] so the whole cycle settles uniformly.
	async fn call_refresh_endpoint(&self) -> Result<SessionToken, RefreshFailure> {
		self.refresh_metrics.record_attempt();

		let request = http::Request::builder()
			.method(http::Method::POST)
			.uri(self.refresh_endpoint.as_str())
			.header(http::header::ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(|e| {
				RefreshFailure::new(None, format!("Failed to build the refresh request: {e}."))
			})?;
		let response = self.http_client.execute(request).await.map_err(|e| {
			RefreshFailure::new(None, format!("Refresh transport failed: {e}."))
		})?;
		let status = response.status().as_u16();

		if !response.status().is_success() {
			return Err(RefreshFailure::new(
				Some(status),
				format!("Refresh endpoint returned HTTP {status}."),
			));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let payload: RefreshResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| {
				RefreshFailure::new(
					Some(status),
					format!("Refresh response could not be parsed: {e}."),
				)
			})?;

		if payload.access_token.is_empty() {
			return Err(RefreshFailure::new(
				Some(status),
				"Refresh response is missing an access token.",
			));
		}

		let mut token = SessionToken::new(payload.access_token);

		if let Some(profile) = payload.user {
			token = token.with_profile(profile);
		}

		Ok(token)
	}
}
