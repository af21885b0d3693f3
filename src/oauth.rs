//! OAuth client facade for the client-credentials exchange.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret, Token},
	descriptor::{ClientAuthMethod, EndpointDescriptor},
	error::{AuthFailureKind, ConfigError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	///
	/// `timeout` is the bound the transport applied to the request, if any.
	fn map_transport_error(
		&self,
		timeout: Option<StdDuration>,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		timeout: Option<StdDuration>,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(timeout, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::from(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

/// Credentials and endpoint wiring for a single client-credentials exchange.
pub(crate) struct ClientCredentialsFacade<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: &'a C,
	error_mapper: &'a M,
}
impl<'a, C, M> ClientCredentialsFacade<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &EndpointDescriptor,
		client_id: &str,
		client_secret: &Secret,
		http_client: &'a C,
		error_mapper: &'a M,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Performs one token request and converts the response into a [`Token`].
	///
	/// `issued_at` stamps the token; `refresh_skew` is subtracted from its nominal expiry.
	pub(crate) async fn exchange(
		&self,
		scope: &ScopeSet,
		delimiter: char,
		issued_at: OffsetDateTime,
		refresh_skew: Duration,
	) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		if !scope.is_empty() {
			if delimiter == ' ' {
				for value in scope.iter() {
					request = request.add_scope(Scope::new(value.to_owned()));
				}
			} else {
				request = request.add_extra_param("scope", scope.join(delimiter));
			}
		}

		let response = request.request_async(&instrumented).await.map_err(|err| {
			map_request_error(
				self.http_client.request_timeout(),
				meta.take(),
				err,
				self.error_mapper,
			)
		})?;

		map_token_response(response, meta.take().and_then(|value| value.status), issued_at, refresh_skew)
	}
}

fn map_token_response(
	response: BasicTokenResponse,
	status: Option<u16>,
	issued_at: OffsetDateTime,
	refresh_skew: Duration,
) -> Result<Token> {
	let malformed = |reason: &str| Error::AuthenticationFailed {
		status,
		kind: AuthFailureKind::Malformed,
		reason: reason.into(),
	};
	let expires_in = response
		.expires_in()
		.ok_or_else(|| malformed("Token endpoint response is missing expires_in"))?
		.as_secs();

	if expires_in == 0 {
		return Err(malformed("The expires_in value must be positive"));
	}

	Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref().to_owned())
		.issued_at(issued_at)
		.ttl_seconds(expires_in)
		.refresh_skew(refresh_skew)
		.build()
		.map_err(|err| malformed(&err.to_string()))
}

fn map_request_error<E, M>(
	timeout: Option<StdDuration>,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_status(meta_ref)),
		RequestTokenError::Request(error) => mapper.map_transport_error(timeout, meta_ref, error),
		RequestTokenError::Parse(error, _body) => {
			let status = meta_status(meta_ref);

			Error::AuthenticationFailed {
				status,
				kind: classify_unparsed(status),
				reason: format!("Token endpoint returned malformed JSON: {error}"),
			}
		},
		RequestTokenError::Other(message) => {
			let status = meta_status(meta_ref);

			Error::AuthenticationFailed {
				status,
				kind: classify_unparsed(status),
				reason: format!("Token endpoint returned an unexpected response: {message}"),
			}
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let code = response.error().as_ref();
	let kind = classify_oauth_error(code).unwrap_or_else(|| classify_status(status));
	let reason = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.to_owned(),
	};

	Error::AuthenticationFailed { status, kind, reason }
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(timeout: Option<StdDuration>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return Error::NetworkTimeout { timeout };
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	let status = meta_status(meta);

	match status {
		Some(_) => Error::AuthenticationFailed {
			status,
			kind: classify_status(status),
			reason: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		},
		None => TransportError::network(std::io::Error::other(message.to_string())).into(),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn classify_oauth_error(code: &str) -> Option<AuthFailureKind> {
	if code.eq_ignore_ascii_case("invalid_client") || code.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(AuthFailureKind::InvalidClient)
	} else if code.eq_ignore_ascii_case("invalid_scope")
		|| code.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(AuthFailureKind::InvalidScope)
	} else if code.eq_ignore_ascii_case("temporarily_unavailable")
		|| code.eq_ignore_ascii_case("server_error")
	{
		Some(AuthFailureKind::Unavailable)
	} else if code.eq_ignore_ascii_case("invalid_request")
		|| code.eq_ignore_ascii_case("invalid_grant")
		|| code.eq_ignore_ascii_case("unsupported_grant_type")
		|| code.eq_ignore_ascii_case("access_denied")
	{
		Some(AuthFailureKind::Rejected)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> AuthFailureKind {
	match status {
		Some(401) => AuthFailureKind::InvalidClient,
		Some(403) => AuthFailureKind::InvalidScope,
		Some(429) => AuthFailureKind::Unavailable,
		Some(code) if code >= 500 => AuthFailureKind::Unavailable,
		_ => AuthFailureKind::Rejected,
	}
}

// A non-2xx status with an unreadable body is still classified by status; a 2xx status with an
// unreadable body is a malformed success response.
fn classify_unparsed(status: Option<u16>) -> AuthFailureKind {
	match status {
		Some(code) if !(200..300).contains(&code) => classify_status(status),
		_ => AuthFailureKind::Malformed,
	}
}
