//! Token provider owning the cached viewer token for one application credential.
//!
//! A [`TokenProvider`] is an explicit value: construct one per credential and share it behind
//! an [`Arc`]. It keeps at most one cached [`Token`], serves it while it is fresh, and
//! otherwise performs a single client-credentials exchange on behalf of every concurrent
//! caller.

pub(crate) mod cache;

mod client_credentials;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, Secret, Token},
	clock::{Clock, SystemClock},
	descriptor::EndpointDescriptor,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	provider::cache::TokenCache,
	viewer::{TokenFuture, TokenSource, TokenSupplier},
};
#[cfg(feature = "reqwest")]
use crate::{config::ViewerConfig, error::ConfigError, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Provider specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenProvider = TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Acquires, caches, and refreshes client-credentials tokens for viewer sessions.
pub struct TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	descriptor: EndpointDescriptor,
	client_id: ClientId,
	client_secret: Secret,
	scope: ScopeSet,
	refresh_skew: Duration,
	clock: Arc<dyn Clock>,
	cache: TokenCache,
}
impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const DEFAULT_REFRESH_SKEW: Duration = Duration::seconds(60);

	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	///
	/// The provider requests `viewables:read`, refreshes 60 seconds before expiry, and reads
	/// the system clock until overridden.
	pub fn with_http_client(
		descriptor: EndpointDescriptor,
		client_id: ClientId,
		client_secret: Secret,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			client_id,
			client_secret,
			scope: ScopeSet::viewables_read(),
			refresh_skew: Self::DEFAULT_REFRESH_SKEW,
			clock: Arc::new(SystemClock),
			cache: TokenCache::default(),
		}
	}

	/// Overrides the requested scopes.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the refresh skew (negative values clamp to zero).
	pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
		self.refresh_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Replaces the time source used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Endpoint descriptor the provider talks to.
	pub fn descriptor(&self) -> &EndpointDescriptor {
		&self.descriptor
	}

	/// Scopes requested for each token.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Margin subtracted from each token's lifetime.
	pub fn refresh_skew(&self) -> Duration {
		self.refresh_skew
	}

	/// Returns the cached token, fresh or not, without contacting the endpoint.
	pub fn cached_token(&self) -> Option<Token> {
		self.cache.peek()
	}

	/// Drops the cached token so the next [`access_token`](Self::access_token) call mints one.
	pub fn invalidate(&self) {
		self.cache.clear();
	}

	/// Returns a [`TokenSupplier`] backed by this provider for a viewer runtime.
	pub fn token_supplier(self: &Arc<Self>) -> TokenSupplier {
		TokenSupplier::new(self.clone())
	}
}
#[cfg(feature = "reqwest")]
impl TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider from validated configuration.
	///
	/// The provider provisions its own reqwest transport, which never follows redirects and
	/// bounds every token request by the configured timeout.
	pub fn new(config: &ViewerConfig) -> Result<Self> {
		config.validate()?;

		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;
		let http_client = ReqwestHttpClient::with_client(client).with_timeout(config.request_timeout());

		Ok(Self::with_http_client(
			config.descriptor()?,
			config.client_id.clone(),
			config.client_secret.clone(),
			http_client,
			ReqwestTransportErrorMapper,
		)
		.with_scope(config.scope.clone())
		.with_refresh_skew(config.refresh_skew()))
	}

	/// Creates a provider from the process environment; see [`ViewerConfig::from_env`].
	pub fn from_env() -> Result<Self> {
		Self::new(&ViewerConfig::from_env()?)
	}
}
impl<C, M> TokenSource for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.access_token())
	}

	fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}
}
impl<C, M> Debug for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("scope", &self.scope)
			.field("refresh_skew", &self.refresh_skew)
			.field("cached", &self.cache.peek().is_some())
			.finish()
	}
}
