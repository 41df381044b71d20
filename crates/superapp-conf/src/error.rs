//! Settings errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
	/// A settings file could not be read.
	#[error("failed to read settings file {path}: {source}")]
	Io {
		/// File being read.
		path: PathBuf,
		/// Underlying error.
		source: std::io::Error,
	},

	/// A settings file is not valid TOML for [`ShellSettings`](crate::ShellSettings).
	#[error("invalid settings file {path}: {source}")]
	Toml {
		/// File being parsed.
		path: PathBuf,
		/// Underlying error.
		source: toml::de::Error,
	},

	/// The `.env` file could not be loaded.
	#[error("failed to load dotenv file {path}: {reason}")]
	Dotenv {
		/// File being loaded.
		path: PathBuf,
		/// Why loading failed.
		reason: String,
	},

	/// A value could not be parsed for its key.
	#[error("invalid value for '{key}' (value length: {value_len}): {error}")]
	InvalidValue {
		/// Setting or environment variable name.
		key: String,
		/// Length of the rejected value.
		value_len: usize,
		/// Parse error.
		error: String,
	},

	/// An override names no known setting.
	#[error("unknown setting: {0}")]
	UnknownKey(String),

	/// The assembled settings are inconsistent.
	#[error("invalid settings: {0}")]
	Validation(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_value_hides_raw_value() {
		let err = SettingsError::InvalidValue {
			key: "SUPERAPP_DOWNLOAD_TIMEOUT_SECS".into(),
			value_len: 3,
			error: "invalid digit found in string".into(),
		};
		let text = err.to_string();
		assert!(text.contains("SUPERAPP_DOWNLOAD_TIMEOUT_SECS"));
		assert!(text.contains("value length: 3"));
	}
}
