// self
use crate::{
	_prelude::*,
	descriptor::{ClientAuthMethod, EndpointDescriptor, default_token_endpoint},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum EndpointDescriptorError {
	/// Endpoints must use HTTPS unless they point at the loopback interface.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`EndpointDescriptor`] values.
#[derive(Debug)]
pub struct EndpointDescriptorBuilder {
	/// Token endpoint used for exchanges.
	pub token_endpoint: Url,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Scope delimiter for the `scope` form field.
	pub scope_delimiter: char,
}
impl EndpointDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = url;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<EndpointDescriptor, EndpointDescriptorError> {
		let descriptor = EndpointDescriptor {
			token: self.token_endpoint,
			client_auth_method: self.client_auth_method,
			scope_delimiter: self.scope_delimiter,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
impl Default for EndpointDescriptorBuilder {
	fn default() -> Self {
		Self {
			token_endpoint: default_token_endpoint(),
			client_auth_method: ClientAuthMethod::default(),
			scope_delimiter: ' ',
		}
	}
}

impl EndpointDescriptor {
	/// Validates invariants for the descriptor.
	pub(crate) fn validate(&self) -> Result<(), EndpointDescriptorError> {
		validate_endpoint(&self.token)?;
		validate_scope_delimiter(self.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(url: &Url) -> Result<(), EndpointDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(EndpointDescriptorError::InsecureEndpoint { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), EndpointDescriptorError> {
	if delimiter.is_control() {
		Err(EndpointDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor URL fixture.")
	}

	#[test]
	fn insecure_remote_endpoints_are_rejected() {
		let err = EndpointDescriptor::builder()
			.token_endpoint(url("http://developer.api.autodesk.com/authentication/v2/token"))
			.build()
			.expect_err("Plain HTTP endpoints must be rejected.");

		assert!(matches!(err, EndpointDescriptorError::InsecureEndpoint { .. }));
	}

	#[test]
	fn loopback_endpoints_may_use_plain_http() {
		for candidate in
			["http://127.0.0.1:8080/token", "http://localhost/token", "http://[::1]:9000/token"]
		{
			EndpointDescriptor::builder()
				.token_endpoint(url(candidate))
				.build()
				.expect("Loopback endpoints should be accepted over HTTP.");
		}
	}

	#[test]
	fn control_character_delimiters_are_rejected() {
		let err = EndpointDescriptor::builder()
			.scope_delimiter('\n')
			.build()
			.expect_err("Control characters cannot delimit scopes.");

		assert_eq!(err, EndpointDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
	}

	#[test]
	fn builder_overrides_apply() {
		let descriptor = EndpointDescriptor::builder()
			.token_endpoint(url("https://auth.example.com/oauth/token"))
			.client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.scope_delimiter(',')
			.build()
			.expect("Descriptor builder should succeed for secure endpoints.");

		assert_eq!(descriptor.token.as_str(), "https://auth.example.com/oauth/token");
		assert_eq!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(descriptor.scope_delimiter, ',');
	}
}
