//! `microapp.json` manifests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PackageError, PackageResult};

/// Parsed micro-app manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroAppManifest {
	/// OAuth client id used for token exchange.
	pub client_id: String,
	/// Remaining manifest fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl MicroAppManifest {
	/// Parses manifest text read from `path`.
	pub fn parse(text: &str, path: &Path) -> PackageResult<Self> {
		let invalid = |reason: String| PackageError::InvalidManifest {
			path: path.to_path_buf(),
			reason,
		};

		let value: Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
		match value.get("clientId") {
			Some(Value::String(id)) if !id.trim().is_empty() => {}
			Some(_) => return Err(invalid("clientId must be a non-empty string".to_string())),
			None => return Err(invalid("missing clientId".to_string())),
		}
		serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
	}

	/// Reads and parses the manifest at `path`.
	pub async fn read(path: &Path) -> PackageResult<Self> {
		let text = tokio::fs::read_to_string(path).await?;
		Self::parse(&text, path)
	}
}
