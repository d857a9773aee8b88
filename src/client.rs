//! Request dispatch loop: authorize, dispatch, recover, replay at most once.

// self
use crate::{
	_prelude::*,
	coordinator::{Coordinator, FailureDisposition, RequestAttempt},
	error::TransportError,
	http::{ApiRequest, ApiResponse, SessionHttpClient, clone_request, set_bearer},
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Session client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient>;

/// Drives coordinated requests through a [`Coordinator`]'s transport.
///
/// Each call to [`execute`](Self::execute) runs the full recovery loop: bearer authorization,
/// dispatch, authentication-failure classification, and at most one replay after a settled
/// refresh cycle. HTTP error statuses that are not authentication failures are ordinary `Ok`
/// responses; only transport breakdowns and failed refresh cycles surface as errors.
pub struct SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	coordinator: Arc<Coordinator<C>>,
}
impl<C> Clone for SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn clone(&self) -> Self {
		Self { coordinator: self.coordinator.clone() }
	}
}
impl<C> Debug for SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient").field("coordinator", &self.coordinator).finish()
	}
}
impl<C> SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a client that dispatches through the coordinator's transport.
	pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
		Self { coordinator }
	}

	/// Returns the coordinator backing this client.
	pub fn coordinator(&self) -> &Arc<Coordinator<C>> {
		&self.coordinator
	}

	/// Dispatches a request with authorization and single-retry recovery.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Dispatch;

		let span = OpSpan::new(KIND, "execute");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut request = request;

				self.coordinator.authorize(&mut request)?;

				// Captured before dispatch so a refresh that settles while this request is in
				// flight is joined instead of repeated.
				let observed_cycle = self.coordinator.cycle();
				let replay = clone_request(&request);
				let response = self.dispatch(request).await?;

				match self
					.coordinator
					.handle_failure(&replay, &response, RequestAttempt::First, observed_cycle)
					.await?
				{
					FailureDisposition::Surface => Ok(response),
					FailureDisposition::Retry(token) => {
						obs::record_op_outcome(OpKind::Retry, OpOutcome::Attempt);

						let mut replay = replay;

						set_bearer(&mut replay, &token)?;

						// The replayed outcome stands as-is; a request is retried at most once
						// per refresh cycle.
						self.dispatch(replay).await
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

	async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.coordinator
			.http_client
			.execute(request)
			.await
			.map_err(|e| TransportError::network(e).into())
	}
}
