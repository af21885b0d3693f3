// self
use crate::obs::TokenOutcome;

/// Records a token outcome via the global metrics recorder (when enabled).
pub fn record_token_outcome(outcome: TokenOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("aps_viewer_auth_token_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
