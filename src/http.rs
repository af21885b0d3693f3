//! Transport primitives for OAuth token exchanges.
//!
//! The module exposes [`TokenHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients without
//! losing the status information the provider needs to classify failures. Implementations
//! call [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status is known.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports capable of executing OAuth token exchanges while
/// publishing response metadata for error mapping.
///
/// The trait is the provider's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a provider can be shared across tasks, and the handles they
/// return must own whatever state their request futures need so those futures stay `Send`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across attempts.
	/// - Once an HTTP response (successful or erroneous) is received, save its status with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;

	/// Upper bound applied to each token request, if the transport enforces one.
	fn request_timeout(&self) -> Option<StdDuration> {
		None
	}
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// The provider creates a fresh slot for each token request and reads the captured metadata
/// immediately after `oauth2` resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] with an optional per-request timeout.
///
/// Token requests should not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	timeout: Option<StdDuration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, timeout: None }
	}

	/// Bounds every token request issued through this client by `timeout`.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient {
			client: self.client.clone(),
			timeout: self.timeout,
			slot,
		}))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}

	fn request_timeout(&self) -> Option<StdDuration> {
		self.timeout
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	timeout: Option<StdDuration>,
	slot: ResponseMetadataSlot,
}

/// Public handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let mut request: reqwest::Request = request.try_into().map_err(Box::new)?;

			if let Some(timeout) = client.timeout {
				*request.timeout_mut() = Some(timeout);
			}

			let response = client.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_clears_value() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_client_reports_configured_timeout() {
		let client = ReqwestHttpClient::default();

		assert_eq!(client.request_timeout(), None);

		let bounded = client.with_timeout(StdDuration::from_secs(5));

		assert_eq!(bounded.request_timeout(), Some(StdDuration::from_secs(5)));
	}
}
