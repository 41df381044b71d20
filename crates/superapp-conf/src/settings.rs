//! Shell settings and their layered loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::{Env, parse_u64};
use crate::error::{SettingsError, SettingsResult};

/// Settings of the super-app shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
	/// Application document root. Packages live under
	/// `<documents_root>/wso2/micro-apps`.
	pub documents_root: PathBuf,
	/// Backend micro-app catalog endpoint. Empty disables catalog sync.
	pub catalog_url: String,
	/// Global object name of the injected bridge runtime.
	pub bridge_namespace: String,
	/// Guest to host transport expression.
	pub bridge_transport: String,
	/// Timeout of archive and catalog fetches, in seconds.
	pub download_timeout_secs: u64,
	/// Default tracing filter directive.
	pub log_filter: String,
}

impl Default for ShellSettings {
	fn default() -> Self {
		Self {
			documents_root: PathBuf::from("./data"),
			catalog_url: String::new(),
			bridge_namespace: "nativebridge".to_string(),
			bridge_transport: "window.ReactNativeWebView.postMessage".to_string(),
			download_timeout_secs: 120,
			log_filter: "superapp=info".to_string(),
		}
	}
}

/// Keys accepted by [`SettingsBuilder::set`] and the environment layer.
pub const KEYS: [&str; 6] = [
	"documents_root",
	"catalog_url",
	"bridge_namespace",
	"bridge_transport",
	"download_timeout_secs",
	"log_filter",
];

impl ShellSettings {
	/// Starts a layered load.
	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}

	/// Parses settings from TOML text. Missing keys keep their defaults.
	pub fn from_toml_str(text: &str, origin: &Path) -> SettingsResult<Self> {
		toml::from_str(text).map_err(|source| SettingsError::Toml {
			path: origin.to_path_buf(),
			source,
		})
	}

	/// Directory holding archives and extracted packages.
	pub fn packages_dir(&self) -> PathBuf {
		self.documents_root.join("wso2").join("micro-apps")
	}

	/// File holding the persisted catalog.
	pub fn catalog_file(&self) -> PathBuf {
		self.documents_root.join("wso2").join("catalog.json")
	}

	/// File holding exchanged micro-app tokens.
	pub fn token_vault_file(&self) -> PathBuf {
		self.documents_root.join("wso2").join("tokens.json")
	}

	/// Directory holding per-app local bridge data.
	pub fn local_data_dir(&self) -> PathBuf {
		self.documents_root.join("wso2").join("local-data")
	}

	/// Catalog endpoint, when configured.
	pub fn catalog_url(&self) -> Option<&str> {
		let url = self.catalog_url.trim();
		(!url.is_empty()).then_some(url)
	}

	/// Fetch timeout.
	pub fn download_timeout(&self) -> Duration {
		Duration::from_secs(self.download_timeout_secs)
	}

	/// Checks cross-field constraints.
	pub fn validate(&self) -> SettingsResult<()> {
		if !is_js_identifier(&self.bridge_namespace) {
			return Err(SettingsError::Validation(format!(
				"bridge_namespace '{}' is not a JavaScript identifier",
				self.bridge_namespace
			)));
		}
		if self.bridge_transport.trim().is_empty() {
			return Err(SettingsError::Validation(
				"bridge_transport must not be empty".to_string(),
			));
		}
		if self.download_timeout_secs == 0 {
			return Err(SettingsError::Validation(
				"download_timeout_secs must be positive".to_string(),
			));
		}
		if let Some(url) = self.catalog_url() {
			url::Url::parse(url).map_err(|e| SettingsError::InvalidValue {
				key: "catalog_url".to_string(),
				value_len: url.len(),
				error: e.to_string(),
			})?;
		}
		Ok(())
	}

	fn apply(&mut self, key: &str, value: &str, origin: &str) -> SettingsResult<()> {
		match key {
			"documents_root" => self.documents_root = PathBuf::from(value),
			"catalog_url" => self.catalog_url = value.to_string(),
			"bridge_namespace" => self.bridge_namespace = value.to_string(),
			"bridge_transport" => self.bridge_transport = value.to_string(),
			"download_timeout_secs" => self.download_timeout_secs = parse_u64(origin, value)?,
			"log_filter" => self.log_filter = value.to_string(),
			other => return Err(SettingsError::UnknownKey(other.to_string())),
		}
		Ok(())
	}
}

fn is_js_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Layered settings loader.
///
/// Layers apply in this order, later ones winning: defaults, TOML file,
/// `.env` file, `SUPERAPP_*` environment variables, explicit overrides.
///
/// # Examples
///
/// ```
/// use superapp_conf::ShellSettings;
///
/// let settings = ShellSettings::builder()
///     .without_dotenv()
///     .without_env()
///     .set("download_timeout_secs", "30")
///     .build()
///     .unwrap();
/// assert_eq!(settings.download_timeout_secs, 30);
/// ```
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
	file: Option<PathBuf>,
	dotenv: Option<PathBuf>,
	env: Option<Env>,
	overrides: Vec<(String, String)>,
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SettingsBuilder {
	/// A loader reading `.env` and `SUPERAPP_*` variables, without a file.
	pub fn new() -> Self {
		Self {
			file: None,
			dotenv: Some(PathBuf::from(".env")),
			env: Some(Env::default()),
			overrides: Vec::new(),
		}
	}

	/// Reads a TOML settings file. The file must exist.
	pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
		self.file = Some(path.into());
		self
	}

	/// Reads `.env` from `path` instead of the working directory.
	pub fn dotenv_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.dotenv = Some(path.into());
		self
	}

	/// Skips the `.env` layer.
	pub fn without_dotenv(mut self) -> Self {
		self.dotenv = None;
		self
	}

	/// Uses `prefix` for the environment layer.
	pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env = Some(Env::new(prefix));
		self
	}

	/// Skips the environment layer.
	pub fn without_env(mut self) -> Self {
		self.env = None;
		self
	}

	/// Overrides one setting.
	pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.overrides.push((key.into(), value.into()));
		self
	}

	/// Loads and validates the settings.
	pub fn build(self) -> SettingsResult<ShellSettings> {
		let mut settings = match &self.file {
			Some(path) => {
				let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
					path: path.clone(),
					source,
				})?;
				ShellSettings::from_toml_str(&text, path)?
			}
			None => ShellSettings::default(),
		};

		if let Some(path) = &self.dotenv {
			load_dotenv(path)?;
		}

		if let Some(env) = &self.env {
			for key in KEYS {
				if let Some(value) = env.str(key) {
					settings.apply(key, &value, &env.key_name(key))?;
				}
			}
		}

		for (key, value) in &self.overrides {
			settings.apply(key, value, key)?;
		}

		settings.validate()?;
		Ok(settings)
	}
}

fn load_dotenv(path: &Path) -> SettingsResult<()> {
	match dotenv::from_path(path) {
		Ok(()) => Ok(()),
		Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(SettingsError::Dotenv {
			path: path.to_path_buf(),
			reason: e.to_string(),
		}),
	}
}
