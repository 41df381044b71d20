//! Prefixed environment variable lookup.

use std::env;

use crate::error::{SettingsError, SettingsResult};

/// Default prefix of shell environment variables.
pub const DEFAULT_PREFIX: &str = "SUPERAPP_";

/// Reads `<PREFIX><KEY>` environment variables.
#[derive(Debug, Clone)]
pub struct Env {
	prefix: String,
}

impl Default for Env {
	fn default() -> Self {
		Self::new(DEFAULT_PREFIX)
	}
}

impl Env {
	/// Creates a reader for `prefix`.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	/// Full variable name of a settings key (`download_timeout_secs` becomes
	/// `SUPERAPP_DOWNLOAD_TIMEOUT_SECS`).
	pub fn key_name(&self, key: &str) -> String {
		format!("{}{}", self.prefix, key.to_ascii_uppercase())
	}

	/// The variable for `key`, if set and valid Unicode.
	pub fn str(&self, key: &str) -> Option<String> {
		env::var(self.key_name(key)).ok()
	}

	/// The variable for `key` parsed as an unsigned integer.
	pub fn u64(&self, key: &str) -> SettingsResult<Option<u64>> {
		let Some(raw) = self.str(key) else {
			return Ok(None);
		};
		parse_u64(&self.key_name(key), &raw).map(Some)
	}
}

/// Parses `raw` for the setting named `key`.
pub(crate) fn parse_u64(key: &str, raw: &str) -> SettingsResult<u64> {
	raw.trim()
		.parse::<u64>()
		.map_err(|e| SettingsError::InvalidValue {
			key: key.to_string(),
			value_len: raw.len(),
			error: e.to_string(),
		})
}
