//! Optional observability helpers for coordinated dispatch.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_guard.op` with the `op` (operation)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `session_guard_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Coordinated operations observed by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Full authorize/dispatch/recover cycle for one caller request.
	Dispatch,
	/// Single-flight refresh cycle.
	Refresh,
	/// One-time replay of a request after a successful refresh.
	Retry,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Dispatch => "dispatch",
			OpKind::Refresh => "refresh",
			OpKind::Retry => "retry",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a coordinated operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
