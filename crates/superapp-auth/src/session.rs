//! Session tokens and their storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::AuthResult;

/// Tokens of the signed-in shell user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
	/// Bearer token for backend calls.
	pub access_token: String,
	/// Token used to obtain a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Identity token, when the provider issues one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Access token expiry.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<DateTime<Utc>>,
}

impl SessionTokens {
	/// Tokens with only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: None,
			id_token: None,
			expires_at: None,
		}
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(token.into());
		self
	}

	/// Sets the expiry.
	pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
		self.expires_at = Some(expires_at);
		self
	}

	/// Whether the access token is past its expiry at `now`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}
}

/// Persistence of the current session.
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Loads the current session.
	async fn load(&self) -> AuthResult<Option<SessionTokens>>;

	/// Replaces the current session.
	async fn save(&self, tokens: &SessionTokens) -> AuthResult<()>;

	/// Removes all session state.
	async fn clear(&self) -> AuthResult<()>;
}

/// In-memory [`SessionStore`].
#[derive(Default)]
pub struct MemorySessionStore {
	tokens: RwLock<Option<SessionTokens>>,
}

impl MemorySessionStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// A store holding `tokens`.
	pub fn with_tokens(tokens: SessionTokens) -> Self {
		Self {
			tokens: RwLock::new(Some(tokens)),
		}
	}
}

#[async_trait]
impl SessionStore for MemorySessionStore {
	async fn load(&self) -> AuthResult<Option<SessionTokens>> {
		Ok(self.tokens.read().clone())
	}

	async fn save(&self, tokens: &SessionTokens) -> AuthResult<()> {
		*self.tokens.write() = Some(tokens.clone());
		Ok(())
	}

	async fn clear(&self) -> AuthResult<()> {
		*self.tokens.write() = None;
		Ok(())
	}
}
