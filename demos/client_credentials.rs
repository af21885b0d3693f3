//! Demonstrates building a provider from environment-style configuration, then feeding a viewer
//! token callback from the cached token. A local mock stands in for the token endpoint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use aps_viewer_auth::{
	config::{
		ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_DOCUMENT_URN, ENV_TOKEN_ENDPOINT, ViewerConfig,
	},
	provider::TokenProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/authentication/v2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let token_endpoint = server.url("/authentication/v2/token");
	let config = ViewerConfig::from_lookup(|key| match key {
		ENV_CLIENT_ID => Some("demo-client".into()),
		ENV_CLIENT_SECRET => Some("demo-secret".into()),
		ENV_DOCUMENT_URN => Some("dXJuOmFkc2sub2JqZWN0czpvcy5vYmplY3Q6ZGVtby9tb2RlbC5ydnQ".into()),
		ENV_TOKEN_ENDPOINT => Some(token_endpoint.clone()),
		_ => None,
	})?;
	let provider = Arc::new(TokenProvider::new(&config)?);
	let supplier = provider.token_supplier();

	for _ in 0..3 {
		supplier
			.supply(|token, ttl| {
				println!("Viewer received a token ({} chars) valid for {ttl}s.", token.len())
			})
			.await?;
	}

	println!("Document to load: {}.", config.document);

	token_mock.assert_async().await;

	Ok(())
}
