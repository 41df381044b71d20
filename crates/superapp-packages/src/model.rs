//! Micro-app catalog records.

use serde::{Deserialize, Serialize};

/// Install state of a micro-app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallStatus {
	/// Known from the catalog, not installed on this device.
	#[default]
	NotDownloaded,
	/// Extracted and registered with an entry point and client id.
	Downloaded,
}

impl InstallStatus {
	/// Wire value.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::NotDownloaded => "NOT_DOWNLOADED",
			Self::Downloaded => "DOWNLOADED",
		}
	}
}

impl std::fmt::Display for InstallStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One published version of a micro-app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppVersion {
	/// Version string, compared verbatim.
	pub version: String,
	/// Build number.
	pub build: u64,
	/// Archive location.
	pub download_url: String,
	/// Icon location.
	pub icon_url: String,
	/// Release notes.
	pub release_notes: String,
}

impl AppVersion {
	/// A version with a download location.
	pub fn new(version: impl Into<String>, download_url: impl Into<String>) -> Self {
		Self {
			version: version.into(),
			download_url: download_url.into(),
			..Self::default()
		}
	}
}

/// Catalog entry of one micro-app.
///
/// `versions` is ordered newest first. The exchanged token is never
/// serialized; it lives in a [`TokenVault`](crate::TokenVault).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroApp {
	/// Unique key.
	pub app_id: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Description.
	#[serde(default)]
	pub description: String,
	/// Published versions, newest first.
	#[serde(default)]
	pub versions: Vec<AppVersion>,
	/// Install state.
	#[serde(default)]
	pub status: InstallStatus,
	/// Entry point locator; empty unless installed.
	#[serde(default)]
	pub web_view_uri: String,
	/// OAuth client id from the manifest; empty unless installed.
	#[serde(default)]
	pub client_id: String,
	/// App-scoped token from the last exchange.
	#[serde(skip)]
	pub exchanged_token: Option<String>,
}

impl MicroApp {
	/// A not-downloaded record with only an id.
	pub fn new(app_id: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			..Self::default()
		}
	}

	/// Sets the display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Appends a version (older than those already present).
	pub fn with_version(mut self, version: AppVersion) -> Self {
		self.versions.push(version);
		self
	}

	/// The newest version.
	pub fn latest(&self) -> Option<&AppVersion> {
		self.versions.first()
	}

	/// Version string of the newest version.
	pub fn latest_version(&self) -> Option<&str> {
		self.latest().map(|v| v.version.as_str())
	}

	/// Archive location of the newest version, if non-empty.
	pub fn download_url(&self) -> Option<&str> {
		self.latest()
			.map(|v| v.download_url.as_str())
			.filter(|url| !url.is_empty())
	}

	/// Whether the app is installed.
	pub fn is_downloaded(&self) -> bool {
		self.status == InstallStatus::Downloaded
	}

	/// Records a successful install.
	pub fn mark_installed(&mut self, web_view_uri: String, client_id: String) {
		self.status = InstallStatus::Downloaded;
		self.web_view_uri = web_view_uri;
		self.client_id = client_id;
	}

	/// Records an uninstall: clears the locator, client id and token.
	pub fn mark_removed(&mut self) {
		self.status = InstallStatus::NotDownloaded;
		self.web_view_uri.clear();
		self.client_id.clear();
		self.exchanged_token = None;
	}

	/// `Downloaded` implies a locator and a client id.
	pub fn is_consistent(&self) -> bool {
		!self.is_downloaded() || (!self.web_view_uri.is_empty() && !self.client_id.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_deserializes_backend_record() {
		// Arrange
		let raw = json!({
			"appId": "wallet",
			"name": "Wallet",
			"description": "Pay things",
			"versions": [{
				"version": "1.1.0",
				"build": 7,
				"downloadUrl": "https://cdn.example.com/wallet-1.1.0.zip",
				"iconUrl": "https://cdn.example.com/wallet.png",
				"releaseNotes": "Faster"
			}],
			"status": "DOWNLOADED",
			"webViewUri": "file:///data/wso2/micro-apps/wallet-extracted/index.html",
			"clientId": "wallet-client",
			"exchangedToken": "secret"
		});

		// Act
		let app: MicroApp = serde_json::from_value(raw).unwrap();

		// Assert
		assert_eq!(app.latest_version(), Some("1.1.0"));
		assert_eq!(app.download_url(), Some("https://cdn.example.com/wallet-1.1.0.zip"));
		assert!(app.is_downloaded());
		assert_eq!(app.exchanged_token, None);
	}

	#[rstest]
	fn test_serialization_never_contains_token() {
		let mut app = MicroApp::new("wallet");
		app.exchanged_token = Some("secret".into());

		let json = serde_json::to_string(&app).unwrap();

		assert!(!json.contains("secret"));
		assert!(!json.contains("exchangedToken"));
		assert!(json.contains("\"status\":\"NOT_DOWNLOADED\""));
	}

	#[rstest]
	fn test_minimal_record_defaults() {
		let app: MicroApp = serde_json::from_value(json!({"appId": "x"})).unwrap();
		assert_eq!(app.status, InstallStatus::NotDownloaded);
		assert_eq!(app.download_url(), None);
		assert!(app.is_consistent());
	}

	#[rstest]
	fn test_install_and_remove_transitions() {
		let mut app = MicroApp::new("wallet");
		app.mark_installed("file:///x/index.html".into(), "client".into());
		assert!(app.is_downloaded() && app.is_consistent());

		app.exchanged_token = Some("t".into());
		app.mark_removed();

		assert_eq!(app.status, InstallStatus::NotDownloaded);
		assert!(app.web_view_uri.is_empty());
		assert!(app.client_id.is_empty());
		assert_eq!(app.exchanged_token, None);
	}

	#[rstest]
	fn test_empty_download_url_is_none() {
		let app = MicroApp::new("x").with_version(AppVersion::new("1.0.0", ""));
		assert_eq!(app.download_url(), None);
	}
}
