//! Client-credentials acquisition with caching + single-flight guards.

// self
use crate::{
	_prelude::*,
	auth::Token,
	error::ConfigError,
	http::TokenHttpClient,
	oauth::{ClientCredentialsFacade, TransportErrorMapper},
	obs::{self, TokenOutcome, TokenSpan},
	provider::{TokenProvider, cache::Acquired},
};

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a token that is fresh at the time of the call.
	///
	/// A cached token is returned without a network call while the clock is before its
	/// refresh-skewed expiry. Otherwise one request is sent to the token endpoint; callers that
	/// arrive while it is pending wait for it and receive the same outcome. A failed request
	/// leaves any previously cached token in place.
	pub async fn access_token(&self) -> Result<Token> {
		self.acquire("access_token", false).await
	}

	/// Requests a new token even if the cached one is still fresh.
	///
	/// Concurrent callers still share a single request.
	pub async fn refresh_access_token(&self) -> Result<Token> {
		self.acquire("refresh_access_token", true).await
	}

	async fn acquire(&self, stage: &'static str, force: bool) -> Result<Token> {
		let span = TokenSpan::new(stage);

		obs::record_token_outcome(TokenOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_credentials()?;

				let clock = &self.clock;

				self.cache.acquire(|| clock.now(), force, || self.mint()).await
			})
			.await;

		match &result {
			Ok(Acquired::Cached(token)) => {
				obs::record_token_outcome(TokenOutcome::CacheHit);
				obs::debug_event(
					"Served token from cache.",
					Some(token.remaining_at(self.clock.now())),
				);
			},
			Ok(Acquired::Shared(_)) => {
				obs::record_token_outcome(TokenOutcome::Shared);
				obs::debug_event("Received token from a concurrent request.", None);
			},
			Ok(Acquired::Minted(token)) => {
				obs::record_token_outcome(TokenOutcome::Success);
				obs::debug_event("Minted token.", Some(token.ttl_seconds));
			},
			Err(err) => {
				obs::record_token_outcome(TokenOutcome::Failure);
				obs::warn_failure(stage, err);
			},
		}

		result.map(Acquired::into_token)
	}

	fn ensure_credentials(&self) -> Result<()> {
		if self.client_secret.is_empty() {
			return Err(ConfigError::Missing { option: "client_secret" }.into());
		}

		Ok(())
	}

	async fn mint(&self) -> Result<Token> {
		let facade = ClientCredentialsFacade::from_descriptor(
			&self.descriptor,
			self.client_id.as_ref(),
			&self.client_secret,
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
		)?;

		facade
			.exchange(&self.scope, self.descriptor.scope_delimiter, self.clock.now(), self.refresh_skew)
			.await
	}
}
