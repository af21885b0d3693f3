// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span wrapper used by the token provider and viewer session.
#[derive(Clone, Debug)]
pub struct TokenSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl TokenSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("aps_viewer_auth.token", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event inside the current span (when tracing is enabled).
///
/// Only static messages and non-secret fields are accepted.
pub fn debug_event(message: &'static str, remaining_secs: Option<u64>) {
	#[cfg(feature = "tracing")]
	{
		match remaining_secs {
			Some(remaining_secs) => tracing::debug!(remaining_secs, "{message}"),
			None => tracing::debug!("{message}"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, remaining_secs);
	}
}

/// Emits a warning for failures surfaced to the caller (when tracing is enabled).
pub fn warn_failure(stage: &'static str, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage, error = %error, "Token acquisition failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = TokenSpan::new("instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);

		debug_event("Served token from cache.", Some(10));
	}
}
