//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	session::SessionToken,
	store::{SessionStore, StoreFuture},
};

type StoreSlot = Arc<RwLock<Option<SessionToken>>>;

/// Thread-safe storage backend that keeps the token in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreSlot);
impl MemoryStore {
	/// Returns a copy of the currently persisted token, if any.
	///
	/// Primarily useful in tests that assert on store contents without going through a
	/// coordinator.
	pub fn snapshot(&self) -> Option<SessionToken> {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<SessionToken>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, token: SessionToken) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(token);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = None;

			Ok(())
		})
	}
}
