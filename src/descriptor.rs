//! Token endpoint descriptor shared by every token request.
//!
//! Vendor endpoint paths and client authentication conventions change independently of this
//! crate, so they are data: the descriptor defaults to the APS v2 authentication endpoint and
//! can be overridden through [`EndpointDescriptorBuilder`] or configuration.

mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Default APS client-credentials token endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://developer.api.autodesk.com/authentication/v2/token";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Validated token endpoint metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
	/// Token endpoint used for client-credentials exchanges.
	pub token: Url,
	/// Client authentication method applied to the token request.
	pub client_auth_method: ClientAuthMethod,
	/// Character used to join scopes in the `scope` form field.
	pub scope_delimiter: char,
}
impl EndpointDescriptor {
	/// Creates a new builder seeded with the APS defaults.
	pub fn builder() -> EndpointDescriptorBuilder {
		EndpointDescriptorBuilder::default()
	}

	/// Descriptor for the public APS authentication endpoint.
	pub fn aps() -> Self {
		Self {
			token: default_token_endpoint(),
			client_auth_method: ClientAuthMethod::ClientSecretPost,
			scope_delimiter: ' ',
		}
	}
}
impl Default for EndpointDescriptor {
	fn default() -> Self {
		Self::aps()
	}
}

pub(crate) fn default_token_endpoint() -> Url {
	Url::parse(DEFAULT_TOKEN_ENDPOINT).expect("Default token endpoint must be a valid URL.")
}
