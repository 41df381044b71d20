//! Session ownership, refresh and forced logout.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{AuthError, AuthResult};
use crate::exchange::{LogoutListener, TokenExchanger, TokenRefresher};
use crate::session::{SessionStore, SessionTokens};
use crate::single_flight::SingleFlight;

/// Owns the shell session.
///
/// Refreshes are single-flight: concurrent callers share one refresh call.
/// An authenticated operation that fails with [`AuthError::Unauthorized`] is
/// retried once after a refresh; if that does not help the session is cleared
/// and every [`LogoutListener`] is notified.
pub struct AuthManager {
	store: Arc<dyn SessionStore>,
	refresher: Arc<dyn TokenRefresher>,
	exchanger: Option<Arc<dyn TokenExchanger>>,
	refresh_flight: SingleFlight<AuthResult<SessionTokens>>,
	listeners: RwLock<Vec<Arc<dyn LogoutListener>>>,
}

impl AuthManager {
	/// Creates a manager over `store`, refreshing through `refresher`.
	pub fn new(store: Arc<dyn SessionStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
		Self {
			store,
			refresher,
			exchanger: None,
			refresh_flight: SingleFlight::new(),
			listeners: RwLock::new(Vec::new()),
		}
	}

	/// Enables micro-app token exchange.
	pub fn with_exchanger(mut self, exchanger: Arc<dyn TokenExchanger>) -> Self {
		self.exchanger = Some(exchanger);
		self
	}

	/// Registers a listener for forced logouts.
	pub fn add_logout_listener(&self, listener: Arc<dyn LogoutListener>) {
		self.listeners.write().push(listener);
	}

	/// Stores the tokens of a fresh sign-in.
	pub async fn sign_in(&self, tokens: SessionTokens) -> AuthResult<()> {
		self.store.save(&tokens).await?;
		tracing::info!("session started");
		Ok(())
	}

	/// Whether a session is stored.
	pub async fn is_signed_in(&self) -> AuthResult<bool> {
		Ok(self.store.load().await?.is_some())
	}

	/// The current access token.
	pub async fn access_token(&self) -> AuthResult<String> {
		self.store
			.load()
			.await?
			.map(|tokens| tokens.access_token)
			.ok_or(AuthError::NoSession)
	}

	/// Refreshes the session, joining a refresh already in flight.
	pub async fn refresh(&self) -> AuthResult<SessionTokens> {
		let store = self.store.clone();
		let refresher = self.refresher.clone();
		self.refresh_flight
			.run(move || async move {
				let current = store.load().await?.ok_or(AuthError::NoSession)?;
				let refresh_token = current
					.refresh_token
					.clone()
					.ok_or_else(|| AuthError::Refresh("session has no refresh token".to_string()))?;

				tracing::debug!("refreshing access token");
				let mut fresh = refresher.refresh(&refresh_token).await?;
				if fresh.refresh_token.is_none() {
					fresh.refresh_token = Some(refresh_token);
				}
				store.save(&fresh).await?;
				Ok(fresh)
			})
			.await
	}

	/// Runs `operation` with the access token, refreshing and retrying once if
	/// it reports [`AuthError::Unauthorized`].
	///
	/// # Errors
	///
	/// Returns [`AuthError::SessionExpired`] after a forced logout when the
	/// refresh fails or the retry is still unauthorized. Other errors of
	/// `operation` are returned unchanged.
	pub async fn call_with_refresh<T, F, Fut>(&self, operation: F) -> AuthResult<T>
	where
		F: Fn(String) -> Fut,
		Fut: Future<Output = AuthResult<T>>,
	{
		let token = self.access_token().await?;
		match operation(token).await {
			Err(AuthError::Unauthorized(reason)) => {
				tracing::debug!("authenticated call rejected ({}); refreshing", reason);
			}
			other => return other,
		}

		let fresh = match self.refresh().await {
			Ok(fresh) => fresh,
			Err(e) => {
				tracing::warn!("token refresh failed: {}", e);
				self.force_logout().await;
				return Err(AuthError::SessionExpired);
			}
		};

		match operation(fresh.access_token).await {
			Err(AuthError::Unauthorized(reason)) => {
				tracing::warn!("still unauthorized after refresh: {}", reason);
				self.force_logout().await;
				Err(AuthError::SessionExpired)
			}
			other => other,
		}
	}

	/// Exchanges the shell token for a token scoped to `client_id`.
	pub async fn exchange_token(&self, client_id: &str) -> AuthResult<String> {
		let exchanger = self
			.exchanger
			.clone()
			.ok_or_else(|| AuthError::Exchange("no token exchanger configured".to_string()))?;
		self.call_with_refresh(|token| {
			let exchanger = exchanger.clone();
			async move { exchanger.exchange(&token, client_id).await }
		})
		.await
	}

	/// Clears all session state and notifies logout listeners.
	pub async fn force_logout(&self) {
		if let Err(e) = self.store.clear().await {
			tracing::error!("failed to clear session: {}", e);
		}
		let listeners = self.listeners.read().clone();
		tracing::warn!(listeners = listeners.len(), "forced logout");
		for listener in listeners {
			listener.on_logout();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::MemorySessionStore;
	use async_trait::async_trait;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	struct CountingRefresher {
		calls: AtomicUsize,
		fail: bool,
	}

	impl CountingRefresher {
		fn new(fail: bool) -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				fail,
			})
		}
	}

	#[async_trait]
	impl TokenRefresher for CountingRefresher {
		async fn refresh(&self, _refresh_token: &str) -> AuthResult<SessionTokens> {
			let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
			tokio::time::sleep(Duration::from_millis(10)).await;
			if self.fail {
				return Err(AuthError::Refresh("provider down".into()));
			}
			Ok(SessionTokens::new(format!("access-{}", n)))
		}
	}

	fn manager(refresher: Arc<CountingRefresher>) -> (AuthManager, Arc<MemorySessionStore>) {
		let store = Arc::new(MemorySessionStore::with_tokens(
			SessionTokens::new("stale").with_refresh_token("refresh"),
		));
		(AuthManager::new(store.clone(), refresher), store)
	}

	#[rstest]
	#[tokio::test]
	async fn test_concurrent_refreshes_issue_one_call() {
		// Arrange
		let refresher = CountingRefresher::new(false);
		let (manager, _store) = manager(refresher.clone());

		// Act
		let (a, b, c) = tokio::join!(manager.refresh(), manager.refresh(), manager.refresh());

		// Assert
		assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
		assert_eq!(a.unwrap().access_token, "access-1");
		assert_eq!(b.unwrap().access_token, "access-1");
		assert_eq!(c.unwrap().access_token, "access-1");
	}

	#[rstest]
	#[tokio::test]
	async fn test_refresh_keeps_refresh_token() {
		let refresher = CountingRefresher::new(false);
		let (manager, store) = manager(refresher);

		manager.refresh().await.unwrap();

		let stored = store.load().await.unwrap().unwrap();
		assert_eq!(stored.access_token, "access-1");
		assert_eq!(stored.refresh_token.as_deref(), Some("refresh"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_call_with_refresh_retries_once() {
		// Arrange
		let refresher = CountingRefresher::new(false);
		let (manager, _store) = manager(refresher.clone());
		let attempts = AtomicUsize::new(0);

		// Act
		let result = manager
			.call_with_refresh(|token| {
				attempts.fetch_add(1, Ordering::SeqCst);
				async move {
					if token == "stale" {
						Err(AuthError::Unauthorized("expired".into()))
					} else {
						Ok(token)
					}
				}
			})
			.await;

		// Assert
		assert_eq!(result.unwrap(), "access-1");
		assert_eq!(attempts.load(Ordering::SeqCst), 2);
		assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_persistent_unauthorized_forces_logout() {
		// Arrange
		let refresher = CountingRefresher::new(false);
		let (manager, store) = manager(refresher);
		let logouts = Arc::new(AtomicUsize::new(0));
		let counter = logouts.clone();
		manager.add_logout_listener(Arc::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));
		let attempts = AtomicUsize::new(0);

		// Act
		let result: AuthResult<()> = manager
			.call_with_refresh(|_token| {
				attempts.fetch_add(1, Ordering::SeqCst);
				async { Err(AuthError::Unauthorized("nope".into())) }
			})
			.await;

		// Assert
		assert_eq!(result.unwrap_err(), AuthError::SessionExpired);
		assert_eq!(attempts.load(Ordering::SeqCst), 2);
		assert_eq!(logouts.load(Ordering::SeqCst), 1);
		assert_eq!(store.load().await.unwrap(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_refresh_forces_logout() {
		let refresher = CountingRefresher::new(true);
		let (manager, store) = manager(refresher);

		let result: AuthResult<()> = manager
			.call_with_refresh(|_token| async { Err(AuthError::Unauthorized("expired".into())) })
			.await;

		assert_eq!(result.unwrap_err(), AuthError::SessionExpired);
		assert!(!manager.is_signed_in().await.unwrap());
		assert_eq!(store.load().await.unwrap(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_other_errors_are_not_retried() {
		let refresher = CountingRefresher::new(false);
		let (manager, _store) = manager(refresher.clone());

		let result: AuthResult<()> = manager
			.call_with_refresh(|_token| async { Err(AuthError::Operation("server error".into())) })
			.await;

		assert_eq!(result.unwrap_err(), AuthError::Operation("server error".into()));
		assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_exchange_requires_exchanger() {
		let (manager, _store) = manager(CountingRefresher::new(false));

		let err = manager.exchange_token("client").await.unwrap_err();

		assert!(matches!(err, AuthError::Exchange(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_session() {
		let manager = AuthManager::new(
			Arc::new(MemorySessionStore::new()),
			CountingRefresher::new(false),
		);
		assert_eq!(manager.access_token().await.unwrap_err(), AuthError::NoSession);
	}
}
