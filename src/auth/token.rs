//! Immutable bearer token model, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifecycle status of a [`Token`] at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is before its refresh-skewed expiry and may be served from cache.
	Fresh,
	/// Token is inside the refresh skew: still accepted upstream, but due for replacement.
	Expiring,
	/// Token is past its nominal expiry.
	Expired,
}

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided, or it was empty.
	#[error("Access token is required and cannot be empty.")]
	MissingAccessToken,
	/// Issued when no time-to-live was configured.
	#[error("Token time-to-live is required.")]
	MissingTtl,
	/// Issued when the time-to-live cannot be represented as an instant.
	#[error("Token time-to-live exceeds the supported range.")]
	TtlOutOfRange,
}

/// Bearer credential minted by the token endpoint.
///
/// `expires_at` is the refresh-skewed instant after which the token is no longer served from
/// cache; it never precedes `issued_at`. The nominal upstream expiry is
/// `issued_at + ttl_seconds`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
	/// Bearer token secret; callers must avoid logging it.
	pub value: Secret,
	/// Token type label, normalized to lowercase (usually `bearer`).
	pub token_type: String,
	/// Instant the token request was issued.
	pub issued_at: OffsetDateTime,
	/// Lifetime reported by the endpoint in seconds.
	pub ttl_seconds: u64,
	/// Refresh-skewed expiry instant.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Returns a builder for constructing tokens.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Nominal expiry instant reported by the endpoint, ignoring refresh skew.
	pub fn nominal_expiry(&self) -> OffsetDateTime {
		self.issued_at + ttl_duration(self.ttl_seconds)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.expires_at {
			TokenStatus::Fresh
		} else if instant < self.nominal_expiry() {
			TokenStatus::Expiring
		} else {
			TokenStatus::Expired
		}
	}

	/// Returns `true` if the token may be served from cache at the provided instant.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Fresh)
	}

	/// Whole seconds of cache validity left at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> u64 {
		u64::try_from((self.expires_at - instant).whole_seconds()).unwrap_or(0)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("value", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("ttl_seconds", &self.ttl_seconds)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	value: Option<Secret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	ttl_seconds: Option<u64>,
	refresh_skew: Duration,
}
impl TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.value = Some(Secret::new(token));

		self
	}

	/// Sets the token type label (stored lowercase).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the lifetime reported by the endpoint.
	pub fn ttl_seconds(mut self, ttl: u64) -> Self {
		self.ttl_seconds = Some(ttl);

		self
	}

	/// Sets the safety margin subtracted from the nominal expiry (negative values clamp to zero).
	pub fn refresh_skew(mut self, skew: Duration) -> Self {
		self.refresh_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let value = self
			.value
			.filter(|value| !value.is_empty())
			.ok_or(TokenBuilderError::MissingAccessToken)?;
		let ttl_seconds = self.ttl_seconds.ok_or(TokenBuilderError::MissingTtl)?;
		let ttl = i64::try_from(ttl_seconds).map_err(|_| TokenBuilderError::TtlOutOfRange)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let nominal = issued_at
			.checked_add(Duration::seconds(ttl))
			.ok_or(TokenBuilderError::TtlOutOfRange)?;
		let expires_at = nominal
			.checked_sub(self.refresh_skew)
			.filter(|instant| *instant > issued_at)
			.unwrap_or(issued_at);

		Ok(Token {
			value,
			token_type: self
				.token_type
				.map(|value| value.to_ascii_lowercase())
				.unwrap_or_else(|| "bearer".into()),
			issued_at,
			ttl_seconds,
			expires_at,
		})
	}
}

fn ttl_duration(ttl_seconds: u64) -> Duration {
	Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn hour_token(issued: OffsetDateTime) -> Token {
		Token::builder()
			.access_token("eyJhbGciOi")
			.issued_at(issued)
			.ttl_seconds(3600)
			.refresh_skew(Duration::seconds(60))
			.build()
			.expect("Token builder should succeed for an hour-long token.")
	}

	#[test]
	fn refresh_skew_moves_expiry_earlier() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = hour_token(issued);

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:59 UTC));
		assert_eq!(token.nominal_expiry(), macros::datetime!(2025-01-01 01:00 UTC));
		assert!(token.is_fresh_at(issued + Duration::seconds(3539)));
		assert!(!token.is_fresh_at(issued + Duration::seconds(3540)));
		assert_eq!(token.status_at(issued + Duration::seconds(3541)), TokenStatus::Expiring);
		assert_eq!(token.status_at(issued + Duration::seconds(3600)), TokenStatus::Expired);
	}

	#[test]
	fn remaining_seconds_clamp_at_zero() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = hour_token(issued);

		assert_eq!(token.remaining_at(issued), 3540);
		assert_eq!(token.remaining_at(issued + Duration::hours(2)), 0);
	}

	#[test]
	fn skew_larger_than_ttl_never_precedes_issue() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token::builder()
			.access_token("short")
			.issued_at(issued)
			.ttl_seconds(30)
			.refresh_skew(Duration::seconds(60))
			.build()
			.expect("Short-lived token should still build.");

		assert_eq!(token.expires_at, issued);
		assert!(!token.is_fresh_at(issued));
	}

	#[test]
	fn builder_rejects_missing_fields() {
		assert_eq!(
			Token::builder().ttl_seconds(60).build().expect_err("Value is required."),
			TokenBuilderError::MissingAccessToken
		);
		assert_eq!(
			Token::builder().access_token("").ttl_seconds(60).build().expect_err("Empty value."),
			TokenBuilderError::MissingAccessToken
		);
		assert_eq!(
			Token::builder().access_token("abc").build().expect_err("TTL is required."),
			TokenBuilderError::MissingTtl
		);
	}

	#[test]
	fn token_type_is_normalized_to_lowercase() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let explicit = Token::builder()
			.access_token("abc")
			.token_type("Bearer")
			.issued_at(issued)
			.ttl_seconds(60)
			.build()
			.expect("Token with explicit type should build.");

		assert_eq!(explicit.token_type, "bearer");
		assert_eq!(hour_token(issued).token_type, "bearer");
	}

	#[test]
	fn debug_output_redacts_value() {
		let token = hour_token(macros::datetime!(2025-01-01 00:00 UTC));
		let rendered = format!("{token:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("eyJhbGciOi"));
	}
}
