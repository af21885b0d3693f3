// self
use crate::{
	_prelude::*,
	obs::{self, TokenSpan},
	viewer::{DocumentUrn, TokenSource, TokenSupplier},
};

/// Boxed future returned by [`ViewerRuntime`] operations; failures carry the runtime's own
/// description.
pub type ViewerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, String>> + 'a + Send>>;

/// Viewer environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "AutodeskProduction";
/// Extension loaded by default for basic navigation.
pub const NAVIGATION_EXTENSION: &str = "Autodesk.DefaultTools.NavTools";

/// Options passed to [`ViewerRuntime::initialize`].
#[derive(Clone, Debug)]
pub struct ViewerOptions {
	/// Runtime environment name.
	pub environment: String,
	/// Extensions the runtime should load.
	pub extensions: Vec<String>,
	/// Token callback the runtime calls whenever it needs a token.
	pub token_supplier: TokenSupplier,
}

/// Document handle produced by a runtime.
pub trait ViewerDocument {
	/// Returns `true` if the document exposes a default 3D or 2D viewable.
	fn has_default_geometry(&self) -> bool;
}

/// Opaque viewer runtime driven by a [`ViewerSession`].
pub trait ViewerRuntime
where
	Self: Send + Sync,
{
	/// Document handle returned by [`load_document`](Self::load_document).
	type Document: ViewerDocument + Send + Sync;

	/// Initializes the runtime and starts the viewer.
	fn initialize<'a>(&'a self, options: &'a ViewerOptions) -> ViewerFuture<'a, ()>;

	/// Loads the manifest for `document_id` (already `urn:`-prefixed).
	fn load_document<'a>(&'a self, document_id: &'a str) -> ViewerFuture<'a, Self::Document>;

	/// Displays the default viewable of a loaded document.
	fn display<'a>(&'a self, document: &'a Self::Document) -> ViewerFuture<'a, ()>;
}

/// Sequences token acquisition, runtime initialization, and document loading.
///
/// A token is obtained before the runtime is touched, so credential problems surface as
/// authentication or configuration errors rather than as runtime failures.
pub struct ViewerSession<R> {
	runtime: R,
	source: Arc<dyn TokenSource>,
	environment: String,
	extensions: Vec<String>,
}
impl<R> ViewerSession<R>
where
	R: ViewerRuntime,
{
	/// Creates a session with the production environment and the navigation extension.
	pub fn new(runtime: R, source: Arc<dyn TokenSource>) -> Self {
		Self {
			runtime,
			source,
			environment: DEFAULT_ENVIRONMENT.into(),
			extensions: vec![NAVIGATION_EXTENSION.into()],
		}
	}

	/// Overrides the runtime environment name.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = environment.into();

		self
	}

	/// Replaces the extension list.
	pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.extensions = extensions.into_iter().map(Into::into).collect();

		self
	}

	/// Underlying runtime.
	pub fn runtime(&self) -> &R {
		&self.runtime
	}

	/// Initializes the runtime and displays `document`.
	///
	/// Errors map as follows: token failures propagate unchanged; runtime initialization
	/// failures become [`Error::ViewerInitializationFailed`]; load and display failures, and
	/// documents without default geometry, become [`Error::DocumentLoadFailed`].
	pub async fn open(&self, document: &DocumentUrn) -> Result<R::Document> {
		let span = TokenSpan::new("viewer_open");
		let result = span
			.instrument(async move {
				self.source.token().await?;

				let options = ViewerOptions {
					environment: self.environment.clone(),
					extensions: self.extensions.clone(),
					token_supplier: TokenSupplier::new(self.source.clone()),
				};

				self.runtime
					.initialize(&options)
					.await
					.map_err(|reason| Error::ViewerInitializationFailed { reason })?;

				let document_id = document.viewer_document_id();
				let load_failed =
					|detail: String| Error::DocumentLoadFailed { document: document_id.clone(), detail };
				let loaded = self.runtime.load_document(&document_id).await.map_err(load_failed)?;

				if !loaded.has_default_geometry() {
					return Err(load_failed("No viewable content found".into()));
				}

				self.runtime.display(&loaded).await.map_err(load_failed)?;

				Ok(loaded)
			})
			.await;

		if let Err(err) = &result {
			obs::warn_failure("viewer_open", err);
		}

		result
	}
}
impl<R> Debug for ViewerSession<R> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ViewerSession")
			.field("environment", &self.environment)
			.field("extensions", &self.extensions)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		auth::Token,
		error::{AuthFailureKind, ConfigError},
		viewer::TokenFuture,
	};

	const T0: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);
	const DOCUMENT: &str = "dXJuOmFkc2sub2JqZWN0czpvcy5vYmplY3Q6YnVja2V0L21vZGVsLnJ2dA";

	struct StaticSource(Result<Token>);
	impl TokenSource for StaticSource {
		fn token(&self) -> TokenFuture<'_> {
			Box::pin(async move { self.0.clone() })
		}

		fn now(&self) -> OffsetDateTime {
			T0
		}
	}

	#[derive(Default)]
	struct FakeRuntime {
		fail_initialize: Option<&'static str>,
		fail_load: Option<&'static str>,
		no_geometry: bool,
		calls: Mutex<Vec<String>>,
	}
	impl ViewerRuntime for FakeRuntime {
		type Document = FakeDocument;

		fn initialize<'a>(&'a self, options: &'a ViewerOptions) -> ViewerFuture<'a, ()> {
			Box::pin(async move {
				let mut supplied = None;

				options
					.token_supplier
					.supply(|value, ttl| supplied = Some(format!("{value}/{ttl}")))
					.await
					.map_err(|err| err.to_string())?;
				self.calls.lock().push(format!(
					"initialize:{}:{}:{}",
					options.environment,
					options.extensions.join(","),
					supplied.unwrap_or_default()
				));

				match self.fail_initialize {
					Some(reason) => Err(reason.to_owned()),
					None => Ok(()),
				}
			})
		}

		fn load_document<'a>(&'a self, document_id: &'a str) -> ViewerFuture<'a, FakeDocument> {
			Box::pin(async move {
				self.calls.lock().push(format!("load:{document_id}"));

				match self.fail_load {
					Some(code) => Err(code.to_owned()),
					None => Ok(FakeDocument { geometry: !self.no_geometry }),
				}
			})
		}

		fn display<'a>(&'a self, _document: &'a FakeDocument) -> ViewerFuture<'a, ()> {
			Box::pin(async move {
				self.calls.lock().push("display".into());

				Ok(())
			})
		}
	}

	#[derive(Debug)]
	struct FakeDocument {
		geometry: bool,
	}
	impl ViewerDocument for FakeDocument {
		fn has_default_geometry(&self) -> bool {
			self.geometry
		}
	}

	fn token_source() -> Arc<dyn TokenSource> {
		let token = Token::builder()
			.access_token("viewer-token")
			.issued_at(T0)
			.ttl_seconds(3600)
			.refresh_skew(Duration::seconds(60))
			.build()
			.expect("Token fixture should build.");

		Arc::new(StaticSource(Ok(token)))
	}

	fn document() -> DocumentUrn {
		DocumentUrn::new(DOCUMENT).expect("Fixture document should parse.")
	}

	#[tokio::test]
	async fn open_initializes_then_loads_and_displays() {
		let session = ViewerSession::new(FakeRuntime::default(), token_source());

		session.open(&document()).await.expect("Session should open the document.");

		assert_eq!(*session.runtime().calls.lock(), vec![
			"initialize:AutodeskProduction:Autodesk.DefaultTools.NavTools:viewer-token/3540"
				.to_owned(),
			format!("load:urn:{DOCUMENT}"),
			"display".to_owned(),
		]);
	}

	#[tokio::test]
	async fn token_failures_stop_before_runtime() {
		let source: Arc<dyn TokenSource> = Arc::new(StaticSource(Err(
			ConfigError::Missing { option: "APS_CLIENT_SECRET" }.into(),
		)));
		let session = ViewerSession::new(FakeRuntime::default(), source);
		let err = session.open(&document()).await.expect_err("Missing secrets must fail.");

		assert!(matches!(err, Error::Config(ConfigError::Missing { .. })));
		assert!(session.runtime().calls.lock().is_empty());

		let source: Arc<dyn TokenSource> = Arc::new(StaticSource(Err(Error::AuthenticationFailed {
			status: Some(401),
			kind: AuthFailureKind::InvalidClient,
			reason: "invalid_client".into(),
		})));
		let session = ViewerSession::new(FakeRuntime::default(), source);
		let err = session.open(&document()).await.expect_err("Rejected credentials must fail.");

		assert_eq!(err.status(), Some(401));
		assert!(session.runtime().calls.lock().is_empty());
	}

	#[tokio::test]
	async fn initialization_failures_are_reported() {
		let runtime = FakeRuntime {
			fail_initialize: Some("WebGL not supported"),
			..Default::default()
		};
		let session = ViewerSession::new(runtime, token_source());
		let err = session.open(&document()).await.expect_err("Initialization failure must surface.");

		assert!(
			matches!(err, Error::ViewerInitializationFailed { ref reason } if reason == "WebGL not supported")
		);
		assert_eq!(session.runtime().calls.lock().len(), 1);
	}

	#[tokio::test]
	async fn load_failures_and_missing_geometry_are_document_errors() {
		let runtime = FakeRuntime { fail_load: Some("404"), ..Default::default() };
		let session = ViewerSession::new(runtime, token_source());
		let err = session.open(&document()).await.expect_err("Load failure must surface.");

		assert!(matches!(err, Error::DocumentLoadFailed { ref detail, .. } if detail == "404"));

		let runtime = FakeRuntime { no_geometry: true, ..Default::default() };
		let session = ViewerSession::new(runtime, token_source()).with_extensions(Vec::<String>::new());
		let err = session.open(&document()).await.expect_err("Empty documents must fail.");

		match err {
			Error::DocumentLoadFailed { document, detail } => {
				assert_eq!(document, format!("urn:{DOCUMENT}"));
				assert_eq!(detail, "No viewable content found");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
		assert!(!session.runtime().calls.lock().iter().any(|call| call == "display"));
	}
}
