//! Identity-provider collaborators.

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::session::SessionTokens;

/// Obtains fresh tokens from a refresh token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
	/// Exchanges `refresh_token` for new session tokens.
	async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens>;
}

/// Swaps the shell access token for a token scoped to one micro-app.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
	/// Returns the app-scoped token for `client_id`.
	///
	/// Implementations report an expired `access_token` as
	/// [`AuthError::Unauthorized`](crate::AuthError::Unauthorized) so the caller
	/// can refresh and retry.
	async fn exchange(&self, access_token: &str, client_id: &str) -> AuthResult<String>;
}

/// Notified after a forced logout.
pub trait LogoutListener: Send + Sync {
	/// Called once the session has been cleared.
	fn on_logout(&self);
}

impl<F> LogoutListener for F
where
	F: Fn() + Send + Sync,
{
	fn on_logout(&self) {
		self()
	}
}
