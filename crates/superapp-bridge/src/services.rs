//! Host collaborators reachable from bridge handlers.
//!
//! Storage, dialogs and Google Drive are platform glue; the bridge only needs
//! the narrow async interfaces below.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

/// Key/value storage scoped per micro-app.
#[async_trait]
pub trait LocalStore: Send + Sync {
	/// Stores `value` under `key` in `namespace`.
	async fn set(&self, namespace: &str, key: &str, value: Value) -> BridgeResult<()>;

	/// Reads the value under `key` in `namespace`.
	async fn get(&self, namespace: &str, key: &str) -> BridgeResult<Option<Value>>;
}

/// In-memory [`LocalStore`].
#[derive(Default)]
pub struct MemoryLocalStore {
	entries: parking_lot::RwLock<HashMap<(String, String), Value>>,
}

impl MemoryLocalStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
	async fn set(&self, namespace: &str, key: &str, value: Value) -> BridgeResult<()> {
		self.entries
			.write()
			.insert((namespace.to_string(), key.to_string()), value);
		Ok(())
	}

	async fn get(&self, namespace: &str, key: &str) -> BridgeResult<Option<Value>> {
		Ok(self
			.entries
			.read()
			.get(&(namespace.to_string(), key.to_string()))
			.cloned())
	}
}

/// [`LocalStore`] keeping one JSON file per namespace under a directory.
pub struct FileLocalStore {
	dir: PathBuf,
	write_lock: tokio::sync::Mutex<()>,
}

impl FileLocalStore {
	/// Creates a store rooted at `dir`. The directory is created on first write.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			write_lock: tokio::sync::Mutex::new(()),
		}
	}

	/// File of `namespace`. The name is form-urlencoded, so distinct
	/// namespaces never share a file and no name escapes `dir`.
	fn file_for(&self, namespace: &str) -> PathBuf {
		let name: String = url::form_urlencoded::byte_serialize(namespace.as_bytes()).collect();
		self.dir.join(format!("{}.json", name))
	}

	async fn read_map(&self, namespace: &str) -> BridgeResult<HashMap<String, Value>> {
		let path = self.file_for(namespace);
		match tokio::fs::read(&path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map_err(|e| BridgeError::Storage(format!("{}: {}", path.display(), e))),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
			Err(e) => Err(BridgeError::Io(e)),
		}
	}
}

#[async_trait]
impl LocalStore for FileLocalStore {
	async fn set(&self, namespace: &str, key: &str, value: Value) -> BridgeResult<()> {
		let _guard = self.write_lock.lock().await;
		let mut map = self.read_map(namespace).await?;
		map.insert(key.to_string(), value);

		tokio::fs::create_dir_all(&self.dir).await?;
		let bytes =
			serde_json::to_vec(&map).map_err(|e| BridgeError::Storage(e.to_string()))?;
		let path = self.file_for(namespace);
		let tmp = path.with_extension("json.tmp");
		tokio::fs::write(&tmp, bytes).await?;
		tokio::fs::rename(&tmp, &path).await?;
		Ok(())
	}

	async fn get(&self, namespace: &str, key: &str) -> BridgeResult<Option<Value>> {
		// Reads queue behind earlier writes.
		let _guard = self.write_lock.lock().await;
		Ok(self.read_map(namespace).await?.remove(key))
	}
}

/// Answer to a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmChoice {
	/// The confirm button was pressed.
	Confirm,
	/// The cancel button was pressed or the dialog was dismissed.
	Cancel,
}

impl ConfirmChoice {
	/// Wire value sent to the guest.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Confirm => "confirm",
			Self::Cancel => "cancel",
		}
	}
}

/// Native dialogs.
#[async_trait]
pub trait Dialogs: Send + Sync {
	/// Shows an alert and waits until it is dismissed.
	async fn alert(&self, title: &str, message: &str, button_text: &str);

	/// Shows a two-button dialog and waits for the choice.
	async fn confirm(
		&self,
		title: &str,
		message: &str,
		cancel_text: &str,
		confirm_text: &str,
	) -> ConfirmChoice;
}

/// Dialogs for headless hosts: alerts are logged, confirmations answered with
/// a fixed choice.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessDialogs {
	answer: ConfirmChoice,
}

impl HeadlessDialogs {
	/// Creates headless dialogs answering every confirmation with `answer`.
	pub fn new(answer: ConfirmChoice) -> Self {
		Self { answer }
	}
}

impl Default for HeadlessDialogs {
	fn default() -> Self {
		Self::new(ConfirmChoice::Cancel)
	}
}

#[async_trait]
impl Dialogs for HeadlessDialogs {
	async fn alert(&self, title: &str, message: &str, _button_text: &str) {
		tracing::info!(title = %title, "alert: {}", message);
	}

	async fn confirm(
		&self,
		title: &str,
		message: &str,
		_cancel_text: &str,
		_confirm_text: &str,
	) -> ConfirmChoice {
		tracing::info!(title = %title, answer = self.answer.as_str(), "confirm: {}", message);
		self.answer
	}
}

/// Google Drive backup collaborator.
#[async_trait]
pub trait GoogleDrive: Send + Sync {
	/// Uploads a backup object and returns the provider response.
	async fn upload(&self, payload: Value) -> BridgeResult<Value>;

	/// Downloads the most recent backup.
	async fn restore_latest(&self) -> BridgeResult<Value>;

	/// Whether a Google account is signed in.
	async fn is_signed_in(&self) -> BridgeResult<bool>;

	/// Profile of the signed-in account.
	async fn user_info(&self) -> BridgeResult<Value>;
}

/// [`GoogleDrive`] for hosts without Google integration.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredDrive;

const DRIVE_UNAVAILABLE: &str = "Google Drive is not configured";

#[async_trait]
impl GoogleDrive for UnconfiguredDrive {
	async fn upload(&self, _payload: Value) -> BridgeResult<Value> {
		Err(BridgeError::Service(DRIVE_UNAVAILABLE.to_string()))
	}

	async fn restore_latest(&self) -> BridgeResult<Value> {
		Err(BridgeError::Service(DRIVE_UNAVAILABLE.to_string()))
	}

	async fn is_signed_in(&self) -> BridgeResult<bool> {
		Ok(false)
	}

	async fn user_info(&self) -> BridgeResult<Value> {
		Err(BridgeError::Service(DRIVE_UNAVAILABLE.to_string()))
	}
}

/// Navigation capability of the hosting screen.
pub trait Navigator: Send + Sync {
	/// Leaves the micro-app screen.
	fn go_back(&self);
}

/// Interactive Google sign-in capability of the hosting screen.
#[async_trait]
pub trait GoogleAuthPrompt: Send + Sync {
	/// Runs the sign-in flow.
	async fn prompt(&self) -> BridgeResult<()>;
}

/// Collaborators shared by every handler invocation.
#[derive(Clone)]
pub struct HostServices {
	/// Per-app key/value storage.
	pub store: Arc<dyn LocalStore>,
	/// Native dialogs.
	pub dialogs: Arc<dyn Dialogs>,
	/// Google Drive backups.
	pub drive: Arc<dyn GoogleDrive>,
}

impl HostServices {
	/// Bundles the given collaborators.
	pub fn new(
		store: Arc<dyn LocalStore>,
		dialogs: Arc<dyn Dialogs>,
		drive: Arc<dyn GoogleDrive>,
	) -> Self {
		Self {
			store,
			dialogs,
			drive,
		}
	}

	/// In-memory storage, headless dialogs, no Google Drive.
	pub fn headless() -> Self {
		Self::new(
			Arc::new(MemoryLocalStore::new()),
			Arc::new(HeadlessDialogs::default()),
			Arc::new(UnconfiguredDrive),
		)
	}
}
