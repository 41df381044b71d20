//! Catalog, installer and queue behind one handle.

use std::sync::Arc;

use crate::catalog::CatalogSource;
use crate::error::{PackageError, PackageResult};
use crate::installer::Installer;
use crate::model::MicroApp;
use crate::queue::{EnqueueOutcome, InstallQueue, InstallRequest, QueueReport};
use crate::reconcile::reconcile;
use crate::registry::PackageRegistry;

/// Result of [`PackageManager::sync_catalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
	/// Apps new in the remote catalog.
	pub added: Vec<String>,
	/// Apps no longer in the remote catalog.
	pub dropped: Vec<String>,
	/// Installed apps queued for an update.
	pub updates: Vec<String>,
	/// Queue run started by the sync, if it got to run.
	pub queue: Option<QueueReport>,
}

/// Package lifecycle entry point used by the shell.
pub struct PackageManager {
	registry: Arc<PackageRegistry>,
	queue: Arc<InstallQueue>,
	catalog: Option<Arc<dyn CatalogSource>>,
}

impl PackageManager {
	/// A manager driving `installer`.
	pub fn new(installer: Installer) -> Self {
		let installer = Arc::new(installer);
		Self {
			registry: installer.registry().clone(),
			queue: Arc::new(InstallQueue::new(installer)),
			catalog: None,
		}
	}

	/// Sets the remote catalog.
	pub fn with_catalog(mut self, source: Arc<dyn CatalogSource>) -> Self {
		self.catalog = Some(source);
		self
	}

	/// Registry of apps.
	pub fn registry(&self) -> &Arc<PackageRegistry> {
		&self.registry
	}

	/// Install queue.
	pub fn queue(&self) -> &Arc<InstallQueue> {
		&self.queue
	}

	/// Snapshot of the catalog.
	pub fn apps(&self) -> Vec<MicroApp> {
		self.registry.apps()
	}

	/// Queues an install of `app_id`.
	///
	/// Without an explicit `download_url` the newest catalog version is used;
	/// an app that is neither in the catalog nor given a URL is unknown.
	pub fn enqueue_install(
		&self,
		app_id: &str,
		download_url: Option<&str>,
	) -> PackageResult<EnqueueOutcome> {
		let url = match download_url {
			Some(url) => url.to_string(),
			None => self
				.registry
				.get(app_id)
				.ok_or_else(|| PackageError::UnknownApp(app_id.to_string()))?
				.download_url()
				.unwrap_or_default()
				.to_string(),
		};
		let outcome = self.queue.try_enqueue(InstallRequest::new(app_id, url));
		if !outcome.is_queued() {
			tracing::debug!(app_id = %app_id, outcome = ?outcome, "install not queued");
		}
		Ok(outcome)
	}

	/// Queues an install and starts processing in the background.
	pub fn request_install(
		&self,
		app_id: &str,
		download_url: Option<&str>,
	) -> PackageResult<EnqueueOutcome> {
		let outcome = self.enqueue_install(app_id, download_url)?;
		if outcome.is_queued() {
			let queue = self.queue.clone();
			tokio::spawn(async move {
				queue.process().await;
			});
		}
		Ok(outcome)
	}

	/// Processes the queue on the current task.
	pub async fn process_queue(&self) -> Option<QueueReport> {
		self.queue.process().await
	}

	/// Uninstalls `app_id`.
	pub async fn remove(&self, app_id: &str) -> PackageResult<()> {
		self.queue.installer().remove(app_id).await
	}

	/// Fetches the remote catalog, merges it with the local one, persists the
	/// result and installs updates of installed apps.
	pub async fn sync_catalog(&self) -> PackageResult<SyncReport> {
		let source = self
			.catalog
			.as_ref()
			.ok_or_else(|| PackageError::Catalog("no catalog source configured".to_string()))?;
		let remote = source.fetch().await?;
		let outcome = reconcile(&self.registry.apps(), remote);

		self.registry.replace_all(outcome.catalog);
		self.registry.persist().await?;

		let mut updates = Vec::new();
		for request in outcome.updates {
			let app_id = request.app_id.clone();
			if self.queue.try_enqueue(request).is_queued() {
				updates.push(app_id);
			}
		}
		tracing::info!(
			added = outcome.added.len(),
			dropped = outcome.dropped.len(),
			updates = updates.len(),
			"catalog synchronized"
		);

		let queue = if updates.is_empty() {
			None
		} else {
			self.queue.process().await
		};
		Ok(SyncReport {
			added: outcome.added,
			dropped: outcome.dropped,
			updates,
			queue,
		})
	}
}

impl std::fmt::Debug for PackageManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PackageManager")
			.field("registry", &self.registry)
			.field("queue", &self.queue)
			.field("has_catalog", &self.catalog.is_some())
			.finish()
	}
}
