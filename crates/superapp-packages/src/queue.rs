//! Serialized install queue.
//!
//! Only one archive is downloaded and extracted at a time. A failed item is
//! dequeued like a successful one and processing moves on.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::installer::Installer;

/// One pending install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
	/// App to install.
	pub app_id: String,
	/// Archive location.
	pub download_url: String,
}

impl InstallRequest {
	/// A request for `app_id` from `download_url`.
	pub fn new(app_id: impl Into<String>, download_url: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			download_url: download_url.into(),
		}
	}
}

/// Result of [`InstallQueue::try_enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
	/// Added; the value is the queue length afterwards.
	Queued(usize),
	/// The app is already waiting in the queue.
	AlreadyQueued,
	/// The app is being installed right now.
	AlreadyDownloading,
}

impl EnqueueOutcome {
	/// Whether the request was added.
	pub fn is_queued(&self) -> bool {
		matches!(self, Self::Queued(_))
	}
}

/// Outcome of one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
	/// Apps installed, in processing order.
	pub installed: Vec<String>,
	/// Apps whose install failed, with the error message.
	pub failed: Vec<(String, String)>,
}

/// FIFO of installs processed one at a time.
pub struct InstallQueue {
	installer: Arc<Installer>,
	pending: Mutex<VecDeque<InstallRequest>>,
	processing: AtomicBool,
}

impl InstallQueue {
	/// A queue feeding `installer`.
	pub fn new(installer: Arc<Installer>) -> Self {
		Self {
			installer,
			pending: Mutex::new(VecDeque::new()),
			processing: AtomicBool::new(false),
		}
	}

	/// Installer fed by this queue.
	pub fn installer(&self) -> &Arc<Installer> {
		&self.installer
	}

	/// Enqueues `request` unless its app is already queued or downloading.
	///
	/// Both checks and the insertion happen under the queue lock, and items
	/// are marked downloading under the same lock when dequeued, so an app is
	/// never queued and installing at once.
	pub fn try_enqueue(&self, request: InstallRequest) -> EnqueueOutcome {
		let mut pending = self.pending.lock();
		if self.installer.registry().is_downloading(&request.app_id) {
			return EnqueueOutcome::AlreadyDownloading;
		}
		if pending.iter().any(|r| r.app_id == request.app_id) {
			return EnqueueOutcome::AlreadyQueued;
		}
		tracing::debug!(app_id = %request.app_id, "install queued");
		pending.push_back(request);
		EnqueueOutcome::Queued(pending.len())
	}

	/// Whether `app_id` is waiting in the queue.
	pub fn contains(&self, app_id: &str) -> bool {
		self.pending.lock().iter().any(|r| r.app_id == app_id)
	}

	/// Number of waiting requests.
	pub fn len(&self) -> usize {
		self.pending.lock().len()
	}

	/// Whether nothing is waiting.
	pub fn is_empty(&self) -> bool {
		self.pending.lock().is_empty()
	}

	/// Whether a processing run is active.
	pub fn is_processing(&self) -> bool {
		self.processing.load(Ordering::Acquire)
	}

	fn pop(&self) -> Option<InstallRequest> {
		let mut pending = self.pending.lock();
		let next = pending.pop_front()?;
		self.installer.registry().mark_downloading(&next.app_id);
		Some(next)
	}

	/// Processes queued installs until the queue is empty.
	///
	/// Returns `None` without doing anything if another run is active.
	pub async fn process(&self) -> Option<QueueReport> {
		if self.processing.swap(true, Ordering::AcqRel) {
			return None;
		}

		let mut report = QueueReport::default();
		loop {
			while let Some(request) = self.pop() {
				match self
					.installer
					.install(&request.app_id, &request.download_url)
					.await
				{
					Ok(_) => report.installed.push(request.app_id),
					Err(e) => report.failed.push((request.app_id, e.to_string())),
				}
			}

			self.processing.store(false, Ordering::Release);
			// Items enqueued between the last pop and the reset would
			// otherwise wait for the next caller.
			if self.is_empty() || self.processing.swap(true, Ordering::AcqRel) {
				break;
			}
		}

		tracing::info!(
			installed = report.installed.len(),
			failed = report.failed.len(),
			"install queue drained"
		);
		Some(report)
	}
}

impl std::fmt::Debug for InstallQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InstallQueue")
			.field("pending", &*self.pending.lock())
			.field("processing", &self.is_processing())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{PackageError, PackageResult};
	use crate::fetch::ArchiveFetcher;
	use crate::layout::PackageLayout;
	use crate::registry::PackageRegistry;
	use async_trait::async_trait;
	use rstest::rstest;
	use std::path::Path;
	use tempfile::TempDir;

	struct FailingFetcher;

	#[async_trait]
	impl ArchiveFetcher for FailingFetcher {
		async fn fetch(&self, url: &str, _dest: &Path) -> PackageResult<u64> {
			Err(PackageError::Download {
				url: url.to_string(),
				reason: "offline".to_string(),
			})
		}
	}

	fn queue(dir: &TempDir) -> InstallQueue {
		let installer = Installer::new(
			PackageLayout::new(dir.path()),
			Arc::new(PackageRegistry::in_memory()),
			Arc::new(FailingFetcher),
		);
		InstallQueue::new(Arc::new(installer))
	}

	#[rstest]
	fn test_enqueue_dedup() {
		let dir = TempDir::new().unwrap();
		let queue = queue(&dir);

		assert_eq!(
			queue.try_enqueue(InstallRequest::new("a", "u")),
			EnqueueOutcome::Queued(1)
		);
		assert_eq!(
			queue.try_enqueue(InstallRequest::new("a", "u")),
			EnqueueOutcome::AlreadyQueued
		);

		queue.installer().registry().mark_downloading("b");
		assert_eq!(
			queue.try_enqueue(InstallRequest::new("b", "u")),
			EnqueueOutcome::AlreadyDownloading
		);
		assert!(queue.contains("a") && !queue.contains("b"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_failures_are_dequeued() {
		let dir = TempDir::new().unwrap();
		let queue = queue(&dir);
		queue.try_enqueue(InstallRequest::new("a", "https://x/a.zip"));
		queue.try_enqueue(InstallRequest::new("b", "https://x/b.zip"));

		let report = queue.process().await.unwrap();

		assert!(report.installed.is_empty());
		assert_eq!(report.failed.len(), 2);
		assert!(queue.is_empty());
		assert!(!queue.is_processing());
		assert!(queue.installer().registry().downloading().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_process_is_reentrancy_guarded() {
		let dir = TempDir::new().unwrap();
		let queue = queue(&dir);
		queue.processing.store(true, Ordering::Release);

		assert_eq!(queue.process().await, None);
	}
}
