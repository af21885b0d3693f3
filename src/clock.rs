//! Time source abstraction used for token expiry decisions.

// self
use crate::_prelude::*;

/// Source of the current instant.
///
/// The provider reads the clock once per call; inject a custom implementation to drive expiry
/// behavior deterministically.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn system_clock_tracks_wall_time() {
		let before = OffsetDateTime::now_utc();
		let now = SystemClock.now();

		assert!(now >= before);
		assert!(now - before < Duration::seconds(5));
	}
}
