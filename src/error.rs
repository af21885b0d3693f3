//! Crate-level error types shared by the token provider, configuration, and viewer glue.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant is cheap to clone so the outcome of a single in-flight token request can be
/// handed to all callers that waited on it.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, including missing required options.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) other than a timeout.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the request or returned a body that could not be used.
	#[error("Authentication failed ({kind}, status {}): {reason}.", display_status(.status))]
	AuthenticationFailed {
		/// HTTP status code, when one was received.
		status: Option<u16>,
		/// Failure classification.
		kind: AuthFailureKind,
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// Token request exceeded the configured bound.
	#[error("Token request exceeded its time bound.")]
	NetworkTimeout {
		/// Configured request bound, when the transport reports one.
		timeout: Option<StdDuration>,
	},
	/// Viewer runtime could not be initialized (unsupported environment, script failure).
	#[error("Viewer initialization failed: {reason}.")]
	ViewerInitializationFailed {
		/// Runtime-supplied reason string.
		reason: String,
	},
	/// Viewer runtime could not resolve or load the requested document.
	#[error("Failed to load document `{document}`: {detail}.")]
	DocumentLoadFailed {
		/// Document identifier passed to the runtime.
		document: String,
		/// Opaque runtime error code or message.
		detail: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by an authentication failure.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthenticationFailed { status, .. } => *status,
			_ => None,
		}
	}
}

/// Classification of [`Error::AuthenticationFailed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureKind {
	/// Client identifier or secret was rejected.
	InvalidClient,
	/// Requested scope is unknown or not granted to the client.
	InvalidScope,
	/// Endpoint rejected the request for another OAuth reason.
	Rejected,
	/// Endpoint is overloaded or failing (429, 5xx).
	Unavailable,
	/// Response body could not be parsed or lacked required fields.
	Malformed,
}
impl AuthFailureKind {
	/// Returns a stable label suitable for logs or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidClient => "invalid_client",
			Self::InvalidScope => "invalid_scope",
			Self::Rejected => "rejected",
			Self::Unavailable => "unavailable",
			Self::Malformed => "malformed",
		}
	}
}
impl Display for AuthFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// A required option is absent from the environment or configuration source.
	#[error("Required configuration option `{option}` is missing.")]
	Missing {
		/// Environment variable or option name.
		option: &'static str,
	},
	/// An option is present but cannot be parsed.
	#[error("Configuration option `{option}` is invalid: {reason}.")]
	Invalid {
		/// Environment variable or option name.
		option: &'static str,
		/// Human-readable parse failure.
		reason: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed: {message}.")]
	HttpRequest {
		/// Underlying builder failure rendered as text.
		message: String,
	},
	/// Endpoint descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Endpoint descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::descriptor::EndpointDescriptorError),
	/// Client identifier failed validation.
	#[error("Client identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Document identifier failed validation.
	#[error(transparent)]
	InvalidDocument(#[from] crate::viewer::DocumentUrnError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { message: e.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io {
		/// Underlying IO failure.
		#[source]
		source: Arc<std::io::Error>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

fn display_status(status: &Option<u16>) -> String {
	match status {
		Some(code) => code.to_string(),
		None => "none".into(),
	}
}
