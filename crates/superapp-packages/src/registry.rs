//! The package registry: the catalog of micro-apps and their install state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::PackageResult;
use crate::model::MicroApp;
use crate::vault::{MemoryTokenVault, TokenVault};

/// Catalog records, the "downloading" marker set, and the token vault.
///
/// Each mutation replaces the whole record of one app. Readers may observe
/// intermediate states, such as an app marked downloading while its status
/// still holds the previous value.
pub struct PackageRegistry {
	apps: RwLock<Vec<MicroApp>>,
	downloading: Mutex<HashSet<String>>,
	catalog_file: Option<PathBuf>,
	persist_lock: tokio::sync::Mutex<()>,
	vault: Arc<dyn TokenVault>,
}

impl std::fmt::Debug for PackageRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PackageRegistry")
			.field("apps", &self.apps.read().len())
			.field("downloading", &*self.downloading.lock())
			.field("catalog_file", &self.catalog_file)
			.finish()
	}
}

impl PackageRegistry {
	/// A registry persisted to `catalog_file`, loading it if present.
	pub async fn open(
		catalog_file: impl Into<PathBuf>,
		vault: Arc<dyn TokenVault>,
	) -> PackageResult<Self> {
		let catalog_file = catalog_file.into();
		let apps = load_catalog(&catalog_file).await?;
		tracing::debug!(
			path = %catalog_file.display(),
			apps = apps.len(),
			"package registry loaded"
		);
		Ok(Self {
			apps: RwLock::new(apps),
			downloading: Mutex::new(HashSet::new()),
			catalog_file: Some(catalog_file),
			persist_lock: tokio::sync::Mutex::new(()),
			vault,
		})
	}

	/// A registry that is never written to disk.
	pub fn in_memory() -> Self {
		Self::with_apps(Vec::new())
	}

	/// An unpersisted registry seeded with `apps`.
	pub fn with_apps(apps: Vec<MicroApp>) -> Self {
		Self {
			apps: RwLock::new(apps),
			downloading: Mutex::new(HashSet::new()),
			catalog_file: None,
			persist_lock: tokio::sync::Mutex::new(()),
			vault: Arc::new(MemoryTokenVault::new()),
		}
	}

	/// Snapshot of every record.
	pub fn apps(&self) -> Vec<MicroApp> {
		self.apps.read().clone()
	}

	/// Snapshot of one record.
	pub fn get(&self, app_id: &str) -> Option<MicroApp> {
		self.apps.read().iter().find(|a| a.app_id == app_id).cloned()
	}

	/// Inserts `app` or replaces the record with the same id.
	pub fn upsert(&self, app: MicroApp) {
		let mut apps = self.apps.write();
		match apps.iter_mut().find(|a| a.app_id == app.app_id) {
			Some(existing) => *existing = app,
			None => apps.push(app),
		}
	}

	/// Applies `f` to the record of `app_id`, if any.
	pub fn update<R>(&self, app_id: &str, f: impl FnOnce(&mut MicroApp) -> R) -> Option<R> {
		let mut apps = self.apps.write();
		apps.iter_mut().find(|a| a.app_id == app_id).map(f)
	}

	/// Replaces the whole catalog.
	pub fn replace_all(&self, apps: Vec<MicroApp>) {
		*self.apps.write() = apps;
	}

	/// Adds `app_id` to the downloading set. Returns `false` if already there.
	pub fn mark_downloading(&self, app_id: &str) -> bool {
		self.downloading.lock().insert(app_id.to_string())
	}

	/// Removes `app_id` from the downloading set.
	pub fn clear_downloading(&self, app_id: &str) {
		self.downloading.lock().remove(app_id);
	}

	/// Whether an install of `app_id` is running.
	pub fn is_downloading(&self, app_id: &str) -> bool {
		self.downloading.lock().contains(app_id)
	}

	/// Ids currently downloading.
	pub fn downloading(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.downloading.lock().iter().cloned().collect();
		ids.sort();
		ids
	}

	/// Catalog file, if persisted.
	pub fn catalog_file(&self) -> Option<&Path> {
		self.catalog_file.as_deref()
	}

	/// Token vault.
	pub fn vault(&self) -> &Arc<dyn TokenVault> {
		&self.vault
	}

	/// Writes the catalog (without tokens) to the catalog file.
	///
	/// The file is replaced atomically through a temporary sibling.
	pub async fn persist(&self) -> PackageResult<()> {
		let Some(path) = self.catalog_file.as_ref() else {
			return Ok(());
		};
		let _guard = self.persist_lock.lock().await;
		let json = serde_json::to_vec_pretty(&self.apps())?;

		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		let tmp = path.with_extension("json.tmp");
		tokio::fs::write(&tmp, json).await?;
		tokio::fs::rename(&tmp, path).await?;
		Ok(())
	}

	/// Stores the exchanged token of `app_id` in the vault and on the record.
	pub async fn set_token(&self, app_id: &str, token: &str) -> PackageResult<()> {
		self.vault.set(app_id, token).await?;
		self.update(app_id, |app| app.exchanged_token = Some(token.to_string()));
		Ok(())
	}

	/// Exchanged token of `app_id`, from the record or the vault.
	pub async fn token(&self, app_id: &str) -> PackageResult<Option<String>> {
		let cached = self
			.get(app_id)
			.and_then(|app| app.exchanged_token);
		match cached {
			Some(token) => Ok(Some(token)),
			None => self.vault.get(app_id).await,
		}
	}
}

async fn load_catalog(path: &Path) -> PackageResult<Vec<MicroApp>> {
	match tokio::fs::read_to_string(path).await {
		Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
		Ok(text) => Ok(serde_json::from_str(&text)?),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
		Err(e) => Err(e.into()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{AppVersion, InstallStatus};
	use rstest::rstest;
	use tempfile::TempDir;

	fn wallet() -> MicroApp {
		MicroApp::new("wallet")
			.with_name("Wallet")
			.with_version(AppVersion::new("1.0.0", "https://cdn/wallet.zip"))
	}

	#[rstest]
	fn test_upsert_replaces_by_id() {
		let registry = PackageRegistry::in_memory();
		registry.upsert(wallet());
		registry.upsert(wallet().with_name("Wallet 2"));

		assert_eq!(registry.apps().len(), 1);
		assert_eq!(registry.get("wallet").unwrap().name, "Wallet 2");
	}

	#[rstest]
	fn test_downloading_marker() {
		let registry = PackageRegistry::in_memory();

		assert!(registry.mark_downloading("wallet"));
		assert!(!registry.mark_downloading("wallet"));
		assert!(registry.is_downloading("wallet"));

		registry.clear_downloading("wallet");
		assert!(!registry.is_downloading("wallet"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_persist_and_reopen_without_token() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let catalog = dir.path().join("wso2/catalog.json");
		let vault: Arc<dyn TokenVault> = Arc::new(MemoryTokenVault::new());
		let registry = PackageRegistry::open(&catalog, vault.clone()).await.unwrap();
		let mut app = wallet();
		app.mark_installed("file:///x/index.html".into(), "wallet-client".into());
		registry.upsert(app);
		registry.set_token("wallet", "secret").await.unwrap();

		// Act
		registry.persist().await.unwrap();
		let reopened = PackageRegistry::open(&catalog, vault).await.unwrap();

		// Assert
		let text = std::fs::read_to_string(&catalog).unwrap();
		assert!(!text.contains("secret"));
		let app = reopened.get("wallet").unwrap();
		assert_eq!(app.status, InstallStatus::Downloaded);
		assert_eq!(app.exchanged_token, None);
		assert_eq!(reopened.token("wallet").await.unwrap().as_deref(), Some("secret"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_open_missing_file_is_empty() {
		let dir = TempDir::new().unwrap();
		let registry = PackageRegistry::open(
			dir.path().join("catalog.json"),
			Arc::new(MemoryTokenVault::new()),
		)
		.await
		.unwrap();

		assert!(registry.apps().is_empty());
	}
}
