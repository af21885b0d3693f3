//! In-memory token cache with single-flight acquisition.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, auth::Token};

/// How a token reached the caller.
#[derive(Clone, Debug)]
pub(crate) enum Acquired {
	/// Served from the cache.
	Cached(Token),
	/// Result of a request issued by another caller while this one waited.
	Shared(Token),
	/// Freshly minted by this caller's request.
	Minted(Token),
}
impl Acquired {
	pub(crate) fn into_token(self) -> Token {
		match self {
			Self::Cached(token) | Self::Shared(token) | Self::Minted(token) => token,
		}
	}
}

/// Cached token state owned by a single provider.
///
/// `current` is swapped whole under a write lock, so readers observe either the previous token
/// or the new one. `flight` serializes endpoint requests; it also keeps the outcome of the last
/// request so callers that queued behind it can share that outcome. `generation` counts
/// completed requests and tells a waiter whether a request finished while it was queued.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
	current: RwLock<Option<Token>>,
	flight: AsyncMutex<Option<Result<Token>>>,
	generation: AtomicU64,
}
impl TokenCache {
	/// Returns the cached token if it is still fresh at `now`.
	pub(crate) fn fresh_at(&self, now: OffsetDateTime) -> Option<Token> {
		self.current.read().as_ref().filter(|token| token.is_fresh_at(now)).cloned()
	}

	/// Returns the cached token regardless of freshness.
	pub(crate) fn peek(&self) -> Option<Token> {
		self.current.read().clone()
	}

	/// Drops the cached token; the next acquisition contacts the endpoint.
	pub(crate) fn clear(&self) {
		self.current.write().take();
	}

	/// Serves a fresh cached token or runs `fetch`, with at most one `fetch` in flight.
	///
	/// `force` skips the cache check. Callers that queued while another caller's `fetch` ran
	/// receive that outcome, success or failure, instead of issuing their own request. Failed
	/// outcomes never touch the cached token.
	pub(crate) async fn acquire<N, F, Fut>(&self, now: N, force: bool, fetch: F) -> Result<Acquired>
	where
		N: Fn() -> OffsetDateTime,
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Token>>,
	{
		let observed = self.generation.load(Ordering::Acquire);

		if !force {
			if let Some(token) = self.fresh_at(now()) {
				return Ok(Acquired::Cached(token));
			}
		}

		let mut last = self.flight.lock().await;

		if self.generation.load(Ordering::Acquire) != observed {
			if let Some(outcome) = last.as_ref() {
				return outcome.clone().map(Acquired::Shared);
			}
		}

		let outcome = fetch().await;

		if let Ok(token) = &outcome {
			*self.current.write() = Some(token.clone());
		}

		*last = Some(outcome.clone());

		self.generation.fetch_add(1, Ordering::AcqRel);

		outcome.map(Acquired::Minted)
	}
}
