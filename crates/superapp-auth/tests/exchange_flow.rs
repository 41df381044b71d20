//! Token exchange through an expiring shell session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rstest::rstest;
use superapp_auth::{
	AuthError, AuthManager, AuthResult, MemorySessionStore, SessionStore, SessionTokens,
	TokenExchanger, TokenRefresher,
};

struct RotatingRefresher;

#[async_trait]
impl TokenRefresher for RotatingRefresher {
	async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
		Ok(SessionTokens::new(format!("fresh-from-{}", refresh_token)))
	}
}

/// Accepts only refreshed shell tokens.
struct Broker {
	calls: AtomicUsize,
}

#[async_trait]
impl TokenExchanger for Broker {
	async fn exchange(&self, access_token: &str, client_id: &str) -> AuthResult<String> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if access_token.starts_with("fresh-") {
			Ok(format!("{}::{}", client_id, access_token))
		} else {
			Err(AuthError::Unauthorized("shell token expired".to_string()))
		}
	}
}

#[rstest]
#[tokio::test]
async fn test_exchange_refreshes_expired_shell_token() {
	// Arrange
	let store = Arc::new(MemorySessionStore::new());
	let broker = Arc::new(Broker {
		calls: AtomicUsize::new(0),
	});
	let manager =
		AuthManager::new(store.clone(), Arc::new(RotatingRefresher)).with_exchanger(broker.clone());
	manager
		.sign_in(SessionTokens::new("expired").with_refresh_token("rt"))
		.await
		.unwrap();

	// Act
	let scoped = manager.exchange_token("wallet-client").await.unwrap();

	// Assert
	assert_eq!(scoped, "wallet-client::fresh-from-rt");
	assert_eq!(broker.calls.load(Ordering::SeqCst), 2);
	assert_eq!(
		store.load().await.unwrap().unwrap().access_token,
		"fresh-from-rt"
	);
}

#[rstest]
#[tokio::test]
async fn test_exchange_without_refresh_token_logs_out() {
	let store = Arc::new(MemorySessionStore::with_tokens(SessionTokens::new("expired")));
	let manager = AuthManager::new(store.clone(), Arc::new(RotatingRefresher)).with_exchanger(
		Arc::new(Broker {
			calls: AtomicUsize::new(0),
		}),
	);

	let err = manager.exchange_token("wallet-client").await.unwrap_err();

	assert_eq!(err, AuthError::SessionExpired);
	assert!(store.load().await.unwrap().is_none());
}
