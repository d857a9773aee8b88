//! Storage contracts and built-in session store implementations.
//!
//! A store holds at most one [`SessionToken`]: the token is read once at startup
//! ([`Coordinator::bootstrap`](crate::coordinator::Coordinator::bootstrap)), written on every
//! successful refresh settlement and login, and cleared when a refresh cycle fails or the
//! session ends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, session::SessionToken};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the session token.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Loads the persisted token, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<SessionToken>>;

	/// Persists or replaces the session token.
	fn save(&self, token: SessionToken) -> StoreFuture<'_, ()>;

	/// Removes any persisted token.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
