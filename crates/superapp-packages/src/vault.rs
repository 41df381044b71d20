//! Storage for exchanged app tokens.
//!
//! Tokens are kept apart from the catalog so that the persisted catalog JSON
//! never carries secrets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::PackageResult;

/// Key-value storage of app-scoped tokens, keyed by app id.
#[async_trait]
pub trait TokenVault: Send + Sync {
	/// Token of `app_id`.
	async fn get(&self, app_id: &str) -> PackageResult<Option<String>>;
	/// Stores the token of `app_id`.
	async fn set(&self, app_id: &str, token: &str) -> PackageResult<()>;
	/// Deletes the token of `app_id`. Missing entries are not an error.
	async fn remove(&self, app_id: &str) -> PackageResult<()>;
}

/// Process-local vault.
#[derive(Debug, Default)]
pub struct MemoryTokenVault {
	tokens: RwLock<HashMap<String, String>>,
}

impl MemoryTokenVault {
	/// An empty vault.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl TokenVault for MemoryTokenVault {
	async fn get(&self, app_id: &str) -> PackageResult<Option<String>> {
		Ok(self.tokens.read().get(app_id).cloned())
	}

	async fn set(&self, app_id: &str, token: &str) -> PackageResult<()> {
		self.tokens
			.write()
			.insert(app_id.to_string(), token.to_string());
		Ok(())
	}

	async fn remove(&self, app_id: &str) -> PackageResult<()> {
		self.tokens.write().remove(app_id);
		Ok(())
	}
}

/// Vault backed by one JSON object file.
///
/// The whole file is rewritten on each change; writes are serialized by an
/// async mutex.
#[derive(Debug)]
pub struct FileTokenVault {
	path: PathBuf,
	lock: tokio::sync::Mutex<()>,
}

impl FileTokenVault {
	/// A vault stored at `path`. The file is created on first write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock: tokio::sync::Mutex::new(()),
		}
	}

	/// Backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn load(&self) -> PackageResult<HashMap<String, String>> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
			Ok(text) => Ok(serde_json::from_str(&text)?),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
			Err(e) => Err(e.into()),
		}
	}

	async fn store(&self, tokens: &HashMap<String, String>) -> PackageResult<()> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		let json = serde_json::to_vec_pretty(tokens)?;
		tokio::fs::write(&self.path, json).await?;
		Ok(())
	}
}

#[async_trait]
impl TokenVault for FileTokenVault {
	async fn get(&self, app_id: &str) -> PackageResult<Option<String>> {
		let _guard = self.lock.lock().await;
		Ok(self.load().await?.remove(app_id))
	}

	async fn set(&self, app_id: &str, token: &str) -> PackageResult<()> {
		let _guard = self.lock.lock().await;
		let mut tokens = self.load().await?;
		tokens.insert(app_id.to_string(), token.to_string());
		self.store(&tokens).await
	}

	async fn remove(&self, app_id: &str) -> PackageResult<()> {
		let _guard = self.lock.lock().await;
		let mut tokens = self.load().await?;
		if tokens.remove(app_id).is_some() {
			self.store(&tokens).await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	#[tokio::test]
	async fn test_memory_vault() {
		let vault = MemoryTokenVault::new();

		vault.set("wallet", "t1").await.unwrap();
		assert_eq!(vault.get("wallet").await.unwrap().as_deref(), Some("t1"));

		vault.remove("wallet").await.unwrap();
		vault.remove("wallet").await.unwrap();
		assert_eq!(vault.get("wallet").await.unwrap(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_file_vault_survives_reopen() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("wso2/tokens.json");
		FileTokenVault::new(&path).set("wallet", "t1").await.unwrap();
		FileTokenVault::new(&path).set("notes", "t2").await.unwrap();

		// Act
		let reopened = FileTokenVault::new(&path);
		reopened.remove("notes").await.unwrap();

		// Assert
		assert_eq!(reopened.get("wallet").await.unwrap().as_deref(), Some("t1"));
		assert_eq!(reopened.get("notes").await.unwrap(), None);
	}
}
