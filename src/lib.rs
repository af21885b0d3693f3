//! Client-credentials token provider for Autodesk Platform Services viewers.
//!
//! The crate caches tokens with a refresh skew, shares one in-flight request between concurrent
//! callers, and implements the token-supplier contract a viewer runtime consumes.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod viewer;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicI64, Ordering};
	// self
	use crate::{
		auth::{ClientId, Secret},
		clock::Clock,
		descriptor::{ClientAuthMethod, EndpointDescriptor},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::TokenProvider,
	};

	/// Provider type alias used by reqwest-backed integration tests.
	pub type ReqwestTestProvider = TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Describes a mock token endpoint served by `httpmock` at `token_url`.
	pub fn test_descriptor(token_url: &str) -> EndpointDescriptor {
		EndpointDescriptor::builder()
			.token_endpoint(Url::parse(token_url).expect("Mock token endpoint should parse."))
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
			.expect("Mock endpoint descriptor should build.")
	}

	/// Constructs a [`TokenProvider`] that talks to `descriptor` through the insecure test
	/// transport, optionally bounding each request by `timeout`.
	pub fn build_reqwest_test_provider(
		descriptor: EndpointDescriptor,
		client_id: &str,
		client_secret: &str,
		timeout: Option<StdDuration>,
	) -> ReqwestTestProvider {
		let mut http_client = test_reqwest_http_client();

		if let Some(timeout) = timeout {
			http_client = http_client.with_timeout(timeout);
		}

		TokenProvider::with_http_client(
			descriptor,
			ClientId::new(client_id).expect("Test client identifier should be valid."),
			Secret::new(client_secret),
			http_client,
			ReqwestTransportErrorMapper,
		)
	}

	/// Manually advanced clock for deterministic expiry tests.
	#[derive(Debug)]
	pub struct ManualClock(AtomicI64);
	impl ManualClock {
		/// Starts the clock at `start`.
		pub fn starting_at(start: OffsetDateTime) -> Arc<Self> {
			Arc::new(Self(AtomicI64::new(start.unix_timestamp())))
		}

		/// Moves the clock forward by `delta`.
		pub fn advance(&self, delta: Duration) {
			self.0.fetch_add(delta.whole_seconds(), Ordering::SeqCst);
		}
	}
	impl Clock for ManualClock {
		fn now(&self) -> OffsetDateTime {
			OffsetDateTime::from_unix_timestamp(self.0.load(Ordering::SeqCst))
				.expect("Manual clock should stay within the supported range.")
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
