//! Viewer configuration sourced from the process environment or a deserialized file.
//!
//! Credentials are never compiled in. [`ViewerConfig::from_env`] reads them from the
//! environment (populated by a secret store in production), and every required option that is
//! absent or empty yields [`ConfigError::Missing`] before any network activity.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, Secret},
	descriptor::{ClientAuthMethod, EndpointDescriptor, default_token_endpoint},
	error::ConfigError,
	viewer::DocumentUrn,
};

/// Environment variable holding the client identifier.
pub const ENV_CLIENT_ID: &str = "APS_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "APS_CLIENT_SECRET";
/// Environment variable holding the document identifier.
pub const ENV_DOCUMENT_URN: &str = "APS_DOCUMENT_URN";
/// Environment variable overriding the token endpoint.
pub const ENV_TOKEN_ENDPOINT: &str = "APS_TOKEN_ENDPOINT";
/// Environment variable overriding the requested scopes (space-separated).
pub const ENV_SCOPE: &str = "APS_SCOPE";
/// Environment variable overriding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "APS_REQUEST_TIMEOUT_SECS";
/// Environment variable overriding the refresh skew in seconds.
pub const ENV_REFRESH_SKEW_SECS: &str = "APS_REFRESH_SKEW_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_SKEW_SECS: u64 = 60;

/// Settings required to mint viewer tokens and open a document.
#[derive(Clone, Debug, Deserialize)]
pub struct ViewerConfig {
	/// Public identifier of the application credential.
	pub client_id: ClientId,
	/// Shared secret of the application credential.
	pub client_secret: Secret,
	/// Document to display.
	pub document: DocumentUrn,
	/// Token endpoint URL.
	#[serde(default = "default_token_endpoint")]
	pub token_endpoint: Url,
	/// How the client credentials are presented to the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
	/// Scopes requested for viewer tokens.
	#[serde(default = "ScopeSet::viewables_read")]
	pub scope: ScopeSet,
	/// Upper bound for a single token request, in seconds.
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
	/// Margin subtracted from each token's lifetime before it is refreshed, in seconds.
	#[serde(default = "default_refresh_skew_secs")]
	pub refresh_skew_secs: u64,
}
impl ViewerConfig {
	/// Creates a configuration with default endpoint, scope, timeout, and skew.
	pub fn new(client_id: ClientId, client_secret: Secret, document: DocumentUrn) -> Self {
		Self {
			client_id,
			client_secret,
			document,
			token_endpoint: default_token_endpoint(),
			client_auth_method: ClientAuthMethod::default(),
			scope: ScopeSet::viewables_read(),
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
			refresh_skew_secs: DEFAULT_REFRESH_SKEW_SECS,
		}
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which maps variable names to values.
	///
	/// Empty values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let require = |key: &'static str| get(key).ok_or(ConfigError::Missing { option: key });
		let client_id = ClientId::new(require(ENV_CLIENT_ID)?.trim())?;
		let client_secret = Secret::new(require(ENV_CLIENT_SECRET)?);
		let document = DocumentUrn::new(require(ENV_DOCUMENT_URN)?.trim())?;
		let mut config = Self::new(client_id, client_secret, document);

		if let Some(raw) = get(ENV_TOKEN_ENDPOINT) {
			config.token_endpoint = Url::parse(raw.trim()).map_err(|err| ConfigError::Invalid {
				option: ENV_TOKEN_ENDPOINT,
				reason: err.to_string(),
			})?;
		}
		if let Some(raw) = get(ENV_SCOPE) {
			config.scope = ScopeSet::from_str(raw.trim())?;
		}
		if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
			config.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
		}
		if let Some(raw) = get(ENV_REFRESH_SKEW_SECS) {
			config.refresh_skew_secs = parse_secs(ENV_REFRESH_SKEW_SECS, &raw)?;
		}

		config.validate()?;

		Ok(config)
	}

	/// Overrides the token endpoint.
	pub fn with_token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = url;

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the request timeout.
	pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
		self.request_timeout_secs = secs;

		self
	}

	/// Overrides the refresh skew.
	pub fn with_refresh_skew_secs(mut self, secs: u64) -> Self {
		self.refresh_skew_secs = secs;

		self
	}

	/// Checks cross-field invariants that deserialization cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_secret.is_empty() {
			return Err(ConfigError::Missing { option: "client_secret" });
		}
		if self.request_timeout_secs == 0 {
			return Err(ConfigError::Invalid {
				option: "request_timeout_secs",
				reason: "timeout must be positive".into(),
			});
		}

		self.descriptor().map(|_| ())
	}

	/// Builds the validated endpoint descriptor for these settings.
	pub fn descriptor(&self) -> Result<EndpointDescriptor, ConfigError> {
		Ok(EndpointDescriptor::builder()
			.token_endpoint(self.token_endpoint.clone())
			.client_auth_method(self.client_auth_method)
			.build()?)
	}

	/// Request timeout as a standard duration.
	pub fn request_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.request_timeout_secs)
	}

	/// Refresh skew as a signed duration.
	pub fn refresh_skew(&self) -> Duration {
		Duration::seconds(i64::try_from(self.refresh_skew_secs).unwrap_or(i64::MAX))
	}
}

fn parse_secs(option: &'static str, raw: &str) -> Result<u64, ConfigError> {
	raw.trim()
		.parse::<u64>()
		.map_err(|err| ConfigError::Invalid { option, reason: err.to_string() })
}

fn default_request_timeout_secs() -> u64 {
	DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_refresh_skew_secs() -> u64 {
	DEFAULT_REFRESH_SKEW_SECS
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		move |key| map.get(key).cloned()
	}

	const REQUIRED: [(&str, &str); 3] = [
		(ENV_CLIENT_ID, "Xy7Q9tYcLZ"),
		(ENV_CLIENT_SECRET, "shh"),
		(ENV_DOCUMENT_URN, "dXJuOmFkc2sub2JqZWN0czpvcy5vYmplY3Q6YnVja2V0L21vZGVsLnJ2dA"),
	];

	#[test]
	fn required_options_load_with_defaults() {
		let config = ViewerConfig::from_lookup(lookup(&REQUIRED))
			.expect("Required options should be enough to build a configuration.");

		assert_eq!(config.client_id.as_ref(), "Xy7Q9tYcLZ");
		assert_eq!(config.client_secret.expose(), "shh");
		assert_eq!(config.token_endpoint.as_str(), crate::descriptor::DEFAULT_TOKEN_ENDPOINT);
		assert_eq!(config.scope, ScopeSet::viewables_read());
		assert_eq!(config.request_timeout(), StdDuration::from_secs(30));
		assert_eq!(config.refresh_skew(), Duration::seconds(60));
	}

	#[test]
	fn each_missing_option_is_reported_by_name() {
		for (idx, (missing, _)) in REQUIRED.iter().enumerate() {
			let pairs = REQUIRED
				.iter()
				.enumerate()
				.filter(|(i, _)| *i != idx)
				.map(|(_, pair)| *pair)
				.collect::<Vec<_>>();
			let err = ViewerConfig::from_lookup(lookup(&pairs))
				.expect_err("Configuration without a required option must fail.");

			assert!(
				matches!(err, ConfigError::Missing { option } if option == *missing),
				"Unexpected error for {missing}: {err:?}"
			);
		}
	}

	#[test]
	fn empty_values_count_as_missing() {
		let mut pairs = REQUIRED.to_vec();

		pairs[1] = (ENV_CLIENT_SECRET, "   ");

		let err = ViewerConfig::from_lookup(lookup(&pairs))
			.expect_err("Whitespace-only secrets must be rejected.");

		assert!(matches!(err, ConfigError::Missing { option: ENV_CLIENT_SECRET }));
	}

	#[test]
	fn optional_overrides_are_parsed() {
		let mut pairs = REQUIRED.to_vec();

		pairs.extend([
			(ENV_TOKEN_ENDPOINT, "https://auth.example.com/token"),
			(ENV_SCOPE, "data:read viewables:read"),
			(ENV_REQUEST_TIMEOUT_SECS, "5"),
			(ENV_REFRESH_SKEW_SECS, "120"),
		]);

		let config =
			ViewerConfig::from_lookup(lookup(&pairs)).expect("Overrides should be accepted.");

		assert_eq!(config.token_endpoint.as_str(), "https://auth.example.com/token");
		assert_eq!(config.scope.normalized(), "data:read viewables:read");
		assert_eq!(config.request_timeout(), StdDuration::from_secs(5));
		assert_eq!(config.refresh_skew(), Duration::seconds(120));
	}

	#[test]
	fn invalid_overrides_are_rejected() {
		let mut pairs = REQUIRED.to_vec();

		pairs.push((ENV_REQUEST_TIMEOUT_SECS, "soon"));

		assert!(matches!(
			ViewerConfig::from_lookup(lookup(&pairs)),
			Err(ConfigError::Invalid { option: ENV_REQUEST_TIMEOUT_SECS, .. })
		));

		let mut pairs = REQUIRED.to_vec();

		pairs.push((ENV_TOKEN_ENDPOINT, "http://auth.example.com/token"));

		assert!(matches!(
			ViewerConfig::from_lookup(lookup(&pairs)),
			Err(ConfigError::Descriptor(_))
		));
	}

	#[test]
	fn deserializes_with_defaults() {
		let config: ViewerConfig = serde_json::from_str(
			r#"{"client_id":"abc","client_secret":"def","document":"urn:ZG9j"}"#,
		)
		.expect("Minimal JSON configuration should deserialize.");

		assert_eq!(config.document.encoded(), "ZG9j");
		assert_eq!(config.refresh_skew_secs, 60);
		assert_eq!(config.client_auth_method, ClientAuthMethod::ClientSecretPost);
		config.validate().expect("Deserialized configuration should validate.");
	}
}
