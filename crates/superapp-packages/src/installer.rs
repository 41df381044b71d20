//! The install/remove pipeline of one micro-app.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{PackageError, PackageResult};
use crate::extract::extract_archive;
use crate::fetch::ArchiveFetcher;
use crate::layout::{PackageLayout, file_uri, validate_app_id};
use crate::manifest::MicroAppManifest;
use crate::model::{InstallStatus, MicroApp};
use crate::registry::PackageRegistry;

/// Transient step of a running install or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallPhase {
	/// Fetching the archive.
	Downloading,
	/// Unpacking the archive.
	Extracting,
	/// Locating the entry point and manifest and updating the record.
	Registering,
	/// Deleting the artifact.
	Removing,
}

impl fmt::Display for InstallPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Downloading => "downloading",
			Self::Extracting => "extracting",
			Self::Registering => "registering",
			Self::Removing => "removing",
		})
	}
}

/// Surfaces installer failures to the user.
#[async_trait]
pub trait InstallAlerts: Send + Sync {
	/// Install of `app_id` failed.
	async fn install_failed(&self, app_id: &str, error: &PackageError);
	/// Remove of `app_id` failed.
	async fn remove_failed(&self, app_id: &str, error: &PackageError);
}

/// Alerts that only log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerts;

#[async_trait]
impl InstallAlerts for LogAlerts {
	async fn install_failed(&self, app_id: &str, error: &PackageError) {
		tracing::error!(app_id = %app_id, error = %error, "{}", error.user_message());
	}

	async fn remove_failed(&self, app_id: &str, error: &PackageError) {
		tracing::error!(app_id = %app_id, error = %error, "micro-app removal failed");
	}
}

/// Drives one app through install and remove.
pub struct Installer {
	layout: PackageLayout,
	registry: Arc<PackageRegistry>,
	fetcher: Arc<dyn ArchiveFetcher>,
	alerts: Arc<dyn InstallAlerts>,
	phases: Mutex<HashMap<String, InstallPhase>>,
}

impl Installer {
	/// An installer writing under `layout` and recording into `registry`.
	pub fn new(
		layout: PackageLayout,
		registry: Arc<PackageRegistry>,
		fetcher: Arc<dyn ArchiveFetcher>,
	) -> Self {
		Self {
			layout,
			registry,
			fetcher,
			alerts: Arc::new(LogAlerts),
			phases: Mutex::new(HashMap::new()),
		}
	}

	/// Replaces the alert sink.
	pub fn with_alerts(mut self, alerts: Arc<dyn InstallAlerts>) -> Self {
		self.alerts = alerts;
		self
	}

	/// Package layout.
	pub fn layout(&self) -> &PackageLayout {
		&self.layout
	}

	/// Registry being updated.
	pub fn registry(&self) -> &Arc<PackageRegistry> {
		&self.registry
	}

	/// Current phase of `app_id`, if an operation is running.
	pub fn phase(&self, app_id: &str) -> Option<InstallPhase> {
		self.phases.lock().get(app_id).copied()
	}

	fn enter(&self, app_id: &str, phase: InstallPhase) {
		tracing::debug!(app_id = %app_id, phase = %phase, "install phase");
		self.phases.lock().insert(app_id.to_string(), phase);
	}

	/// Installs (or updates) `app_id` from `download_url`.
	///
	/// On failure the app's status is rolled back to `NOT_DOWNLOADED` and an
	/// alert is raised; files already written stay in place. A missing
	/// download URL fails before anything is touched. The downloading marker
	/// is cleared in every case.
	pub async fn install(&self, app_id: &str, download_url: &str) -> PackageResult<MicroApp> {
		self.registry.mark_downloading(app_id);
		let result = self.run_install(app_id, download_url).await;
		self.phases.lock().remove(app_id);
		self.registry.clear_downloading(app_id);

		match result {
			Ok(app) => {
				tracing::info!(app_id = %app_id, uri = %app.web_view_uri, "micro-app installed");
				Ok(app)
			}
			Err(error) => {
				tracing::error!(app_id = %app_id, error = %error, "micro-app install failed");
				if !matches!(error, PackageError::EmptyDownloadUrl(_)) {
					self.roll_back(app_id).await;
				}
				self.alerts.install_failed(app_id, &error).await;
				Err(error)
			}
		}
	}

	async fn run_install(&self, app_id: &str, download_url: &str) -> PackageResult<MicroApp> {
		if download_url.is_empty() {
			return Err(PackageError::EmptyDownloadUrl(app_id.to_string()));
		}
		validate_app_id(app_id)?;

		self.enter(app_id, InstallPhase::Downloading);
		tokio::fs::create_dir_all(self.layout.packages_dir()).await?;
		let archive = self.layout.archive_path(app_id);
		self.fetcher.fetch(download_url, &archive).await?;

		let size = match tokio::fs::metadata(&archive).await {
			Ok(meta) => meta.len(),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
			Err(e) => return Err(e.into()),
		};
		if size == 0 {
			return Err(PackageError::EmptyArchive(archive));
		}

		self.enter(app_id, InstallPhase::Extracting);
		extract_archive(&archive, &self.layout.extracted_dir(app_id)).await?;

		self.enter(app_id, InstallPhase::Registering);
		let entry = self.layout.find_entry_point(app_id).await?;
		let manifest_path = self.layout.find_manifest(app_id).await?;
		let manifest = MicroAppManifest::read(&manifest_path).await?;
		let uri = file_uri(&entry)?;

		let installed = self
			.registry
			.update(app_id, |app| {
				app.mark_installed(uri.clone(), manifest.client_id.clone());
				app.clone()
			})
			.unwrap_or_else(|| {
				let mut app = MicroApp::new(app_id);
				app.mark_installed(uri, manifest.client_id);
				self.registry.upsert(app.clone());
				app
			});
		self.registry.persist().await?;
		Ok(installed)
	}

	async fn roll_back(&self, app_id: &str) {
		let changed = self
			.registry
			.update(app_id, |app| {
				let was = app.status;
				app.status = InstallStatus::NotDownloaded;
				was != InstallStatus::NotDownloaded
			})
			.unwrap_or(false);
		if changed {
			if let Err(e) = self.registry.persist().await {
				tracing::warn!(app_id = %app_id, error = %e, "failed to persist rolled back status");
			}
		}
	}

	/// Removes the artifact and archive of `app_id` and marks it not downloaded.
	///
	/// Missing files are not an error, so removing twice succeeds. If deletion
	/// fails, the app stays `DOWNLOADED` and the error is surfaced.
	pub async fn remove(&self, app_id: &str) -> PackageResult<()> {
		self.enter(app_id, InstallPhase::Removing);
		let result = self.run_remove(app_id).await;
		self.phases.lock().remove(app_id);

		if let Err(error) = &result {
			self.alerts.remove_failed(app_id, error).await;
		} else {
			tracing::info!(app_id = %app_id, "micro-app removed");
		}
		result
	}

	async fn run_remove(&self, app_id: &str) -> PackageResult<()> {
		validate_app_id(app_id)?;

		match tokio::fs::remove_dir_all(self.layout.extracted_dir(app_id)).await {
			Ok(()) => {}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => return Err(e.into()),
		}
		match tokio::fs::remove_file(self.layout.archive_path(app_id)).await {
			Ok(()) => {}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => return Err(e.into()),
		}

		self.registry.update(app_id, MicroApp::mark_removed);
		self.registry.vault().remove(app_id).await?;
		self.registry.persist().await
	}
}

impl fmt::Debug for Installer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Installer")
			.field("layout", &self.layout)
			.field("registry", &self.registry)
			.finish()
	}
}
