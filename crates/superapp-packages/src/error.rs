//! Package lifecycle errors.

use std::path::PathBuf;

use superapp_auth::AuthError;
use thiserror::Error;

/// Result type for package operations.
pub type PackageResult<T> = Result<T, PackageError>;

/// Package lifecycle errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageError {
	/// The app has no archive location.
	#[error("no download URL for micro-app '{0}'")]
	EmptyDownloadUrl(String),

	/// The app id cannot be used as a file name.
	#[error("invalid micro-app id '{0}'")]
	InvalidAppId(String),

	/// The app is not in the catalog.
	#[error("unknown micro-app '{0}'")]
	UnknownApp(String),

	/// The archive download failed.
	#[error("download of '{url}' failed: {reason}")]
	Download {
		/// Requested location.
		url: String,
		/// Failure detail.
		reason: String,
	},

	/// The downloaded archive is missing or empty.
	#[error("downloaded archive {0} is missing or empty")]
	EmptyArchive(PathBuf),

	/// The archive could not be unpacked.
	#[error("failed to extract {path}: {reason}")]
	Extract {
		/// Archive being extracted.
		path: PathBuf,
		/// Failure detail.
		reason: String,
	},

	/// Neither entry point candidate exists.
	#[error("index not found in {0}")]
	IndexNotFound(PathBuf),

	/// Neither manifest candidate exists.
	#[error("manifest not found in {0}")]
	ManifestNotFound(PathBuf),

	/// The manifest is not valid JSON or lacks `clientId`.
	#[error("invalid manifest {path}: {reason}")]
	InvalidManifest {
		/// Manifest file.
		path: PathBuf,
		/// Failure detail.
		reason: String,
	},

	/// The catalog could not be fetched.
	#[error("catalog fetch failed: {0}")]
	Catalog(String),

	/// Authentication failed while talking to the backend.
	#[error(transparent)]
	Auth(#[from] AuthError),

	/// Catalog or vault JSON could not be (de)serialized.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// IO error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl PackageError {
	/// Short message suitable for a user-facing alert.
	pub fn user_message(&self) -> String {
		match self {
			Self::EmptyDownloadUrl(_) => "This app has no download available yet.".to_string(),
			Self::Download { .. } | Self::EmptyArchive(_) => {
				"The app could not be downloaded. Check your connection and try again.".to_string()
			}
			Self::Extract { .. }
			| Self::IndexNotFound(_)
			| Self::ManifestNotFound(_)
			| Self::InvalidManifest { .. } => {
				"The app package is damaged. Try installing it again later.".to_string()
			}
			Self::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
			other => other.to_string(),
		}
	}
}
