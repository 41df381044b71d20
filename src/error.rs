//! Errors of the host shell.

use superapp_auth::AuthError;
use superapp_conf::SettingsError;
use superapp_packages::PackageError;
use thiserror::Error;

/// Result type for host shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors surfaced by [`MicroAppHost`](crate::MicroAppHost).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShellError {
	/// The app exists but is not installed on this device.
	#[error("micro-app '{0}' is not installed")]
	NotInstalled(String),

	/// Settings could not be loaded.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// A package operation failed.
	#[error(transparent)]
	Package(#[from] PackageError),

	/// Authentication or token exchange failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
}
