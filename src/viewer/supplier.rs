// self
use crate::{_prelude::*, auth::Token};

/// Boxed future resolving to a token.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<Token>> + 'a + Send>>;

/// Object-safe view of a token provider, used by [`TokenSupplier`] and viewer sessions.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token that is fresh at the time of the call.
	fn token(&self) -> TokenFuture<'_>;

	/// Current instant according to the source's clock.
	fn now(&self) -> OffsetDateTime;
}

/// Token callback handed to a viewer runtime.
///
/// The runtime calls [`supply`](Self::supply) whenever it needs a token; the callback receives
/// the token value and the number of whole seconds it may be used before the runtime should
/// ask again. That lifetime is measured to the refresh-skewed expiry, so the runtime never
/// holds a token the provider would no longer serve.
#[derive(Clone)]
pub struct TokenSupplier {
	source: Arc<dyn TokenSource>,
}
impl TokenSupplier {
	/// Wraps a token source.
	pub fn new(source: Arc<dyn TokenSource>) -> Self {
		Self { source }
	}

	/// Obtains a token and passes it to `callback`.
	///
	/// On failure the callback is not invoked and the error is returned instead.
	pub async fn supply<F>(&self, callback: F) -> Result<()>
	where
		F: FnOnce(&str, u64),
	{
		let token = self.source.token().await?;
		let ttl_seconds = token.remaining_at(self.source.now());

		callback(token.value.expose(), ttl_seconds);

		Ok(())
	}
}
impl Debug for TokenSupplier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSupplier").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::error::AuthFailureKind;

	const T0: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	struct FixedSource {
		outcome: Result<Token>,
		now: OffsetDateTime,
		calls: AtomicUsize,
	}
	impl TokenSource for FixedSource {
		fn token(&self) -> TokenFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async move { self.outcome.clone() })
		}

		fn now(&self) -> OffsetDateTime {
			self.now
		}
	}

	fn hour_token() -> Token {
		Token::builder()
			.access_token("viewer-token")
			.issued_at(T0)
			.ttl_seconds(3600)
			.refresh_skew(Duration::seconds(60))
			.build()
			.expect("Token fixture should build.")
	}

	#[tokio::test]
	async fn supply_reports_remaining_skewed_lifetime() {
		let source = Arc::new(FixedSource {
			outcome: Ok(hour_token()),
			now: T0 + Duration::seconds(40),
			calls: AtomicUsize::new(0),
		});
		let supplier = TokenSupplier::new(source.clone());
		let mut received = None;

		supplier
			.supply(|value, ttl| received = Some((value.to_owned(), ttl)))
			.await
			.expect("Supplier should deliver the token.");

		assert_eq!(received, Some(("viewer-token".to_owned(), 3500)));
		assert_eq!(source.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn supply_skips_callback_on_failure() {
		let supplier = TokenSupplier::new(Arc::new(FixedSource {
			outcome: Err(Error::AuthenticationFailed {
				status: Some(401),
				kind: AuthFailureKind::InvalidClient,
				reason: "invalid_client".into(),
			}),
			now: T0,
			calls: AtomicUsize::new(0),
		}));
		let mut invoked = false;
		let err = supplier
			.supply(|_, _| invoked = true)
			.await
			.expect_err("Failures should propagate to the runtime.");

		assert!(!invoked);
		assert_eq!(err.status(), Some(401));
	}
}
