//! Authentication error types.

use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors.
///
/// `Clone` so a single refresh outcome can be shared by every concurrent
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
	/// The backend rejected the access token (expired or invalid).
	#[error("unauthorized: {0}")]
	Unauthorized(String),

	/// No session is active.
	#[error("no active session")]
	NoSession,

	/// The refresh call failed.
	#[error("token refresh failed: {0}")]
	Refresh(String),

	/// The token exchange for a micro-app failed.
	#[error("token exchange failed: {0}")]
	Exchange(String),

	/// Refresh could not recover the session; the user was logged out.
	#[error("session expired; signed out")]
	SessionExpired,

	/// Session storage failed.
	#[error("session storage error: {0}")]
	Storage(String),

	/// The authenticated operation failed for a reason unrelated to auth.
	#[error("{0}")]
	Operation(String),
}

impl AuthError {
	/// Whether a token refresh may fix this error.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized(_))
	}
}
