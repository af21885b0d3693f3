//! Optional observability helpers for token acquisition.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `aps_viewer_auth.token` with a `stage` field, plus
//!   debug events for cache hits and minted tokens. Token values are never recorded.
//! - Enable `metrics` to increment the `aps_viewer_auth_token_total` counter for every
//!   attempt/cache hit/shared result/success/failure, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each `access_token` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenOutcome {
	/// Entry to the provider.
	Attempt,
	/// Served from the cache without a network call.
	CacheHit,
	/// Received the result of a request another caller issued.
	Shared,
	/// A new token was minted by the endpoint.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl TokenOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenOutcome::Attempt => "attempt",
			TokenOutcome::CacheHit => "cache_hit",
			TokenOutcome::Shared => "shared",
			TokenOutcome::Success => "success",
			TokenOutcome::Failure => "failure",
		}
	}
}
impl Display for TokenOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
