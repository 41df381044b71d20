//! Install, update and remove flows against a temporary document root.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rstest::rstest;
use superapp_packages::{
	AppVersion, ArchiveFetcher, HttpFetcher, InstallRequest, InstallStatus, Installer,
	MemoryTokenVault, MicroApp, PackageError, PackageLayout, PackageManager, PackageRegistry,
	PackageResult, StaticCatalog,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn package(client_id: &str) -> Vec<u8> {
	let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
	let options = SimpleFileOptions::default();
	zip.start_file("index.html", options).unwrap();
	zip.write_all(b"<html><body>micro-app</body></html>").unwrap();
	zip.start_file("microapp.json", options).unwrap();
	write!(zip, r#"{{"clientId":"{}"}}"#, client_id).unwrap();
	zip.start_file("__MACOSX/._index.html", options).unwrap();
	zip.write_all(b"resource fork").unwrap();
	zip.finish().unwrap().into_inner()
}

/// Serves a valid package for every URL except those containing `fail`.
#[derive(Default)]
struct CountingFetcher {
	calls: AtomicUsize,
}

#[async_trait]
impl ArchiveFetcher for CountingFetcher {
	async fn fetch(&self, url: &str, dest: &Path) -> PackageResult<u64> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if url.contains("fail") {
			return Err(PackageError::Download {
				url: url.to_string(),
				reason: "connection reset".to_string(),
			});
		}
		let bytes = package("client");
		tokio::fs::write(dest, &bytes).await?;
		Ok(bytes.len() as u64)
	}
}

async fn open_registry(root: &Path) -> Arc<PackageRegistry> {
	Arc::new(
		PackageRegistry::open(root.join("wso2/catalog.json"), Arc::new(MemoryTokenVault::new()))
			.await
			.unwrap(),
	)
}

fn manager(root: &Path, registry: Arc<PackageRegistry>, fetcher: Arc<CountingFetcher>) -> PackageManager {
	PackageManager::new(Installer::new(PackageLayout::new(root), registry, fetcher))
}

#[rstest]
#[tokio::test]
async fn test_install_from_local_archive_end_to_end() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let source = dir.path().join("wallet-1.0.0.zip");
	std::fs::write(&source, package("wallet-client")).unwrap();
	let url = url::Url::from_file_path(&source).unwrap().to_string();
	let registry = open_registry(dir.path()).await;
	registry.upsert(MicroApp::new("wallet").with_version(AppVersion::new("1.0.0", url)));
	let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
	let manager = PackageManager::new(Installer::new(
		PackageLayout::new(dir.path()),
		registry.clone(),
		Arc::new(fetcher),
	));

	// Act
	assert!(manager.enqueue_install("wallet", None).unwrap().is_queued());
	let report = manager.process_queue().await.unwrap();

	// Assert
	assert_eq!(report.installed, vec!["wallet".to_string()]);
	let reopened = open_registry(dir.path()).await;
	let app = reopened.get("wallet").unwrap();
	assert_eq!(app.status, InstallStatus::Downloaded);
	assert_eq!(app.client_id, "wallet-client");
	assert!(app.web_view_uri.ends_with("/wso2/micro-apps/wallet-extracted/index.html"));
	assert!(
		!dir.path()
			.join("wso2/micro-apps/wallet-extracted/__MACOSX")
			.exists()
	);
}

#[rstest]
#[tokio::test]
async fn test_remove_without_artifacts_succeeds() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let registry = open_registry(dir.path()).await;
	registry.upsert(MicroApp::new("wallet"));
	let manager = manager(dir.path(), registry.clone(), Arc::default());

	// Act
	manager.remove("wallet").await.unwrap();
	manager.remove("wallet").await.unwrap();

	// Assert
	assert_eq!(registry.get("wallet").unwrap().status, InstallStatus::NotDownloaded);
}

#[rstest]
#[tokio::test]
async fn test_empty_download_url_leaves_persisted_status() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let registry = open_registry(dir.path()).await;
	let mut app = MicroApp::new("wallet").with_version(AppVersion::new("1.0.0", ""));
	app.mark_installed("file:///old/index.html".into(), "wallet-client".into());
	registry.upsert(app);
	registry.persist().await.unwrap();
	let fetcher = Arc::new(CountingFetcher::default());
	let manager = manager(dir.path(), registry, fetcher.clone());

	// Act
	manager.enqueue_install("wallet", None).unwrap();
	let report = manager.process_queue().await.unwrap();

	// Assert
	assert_eq!(report.failed.len(), 1);
	assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
	let persisted = open_registry(dir.path()).await.get("wallet").unwrap();
	assert_eq!(persisted.status, InstallStatus::Downloaded);
	assert_eq!(persisted.web_view_uri, "file:///old/index.html");
}

#[rstest]
#[tokio::test]
async fn test_version_change_installs_once() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let registry = open_registry(dir.path()).await;
	let mut local = MicroApp::new("wallet").with_version(AppVersion::new("1.0.0", "https://cdn/w-1.0.0.zip"));
	local.mark_installed("file:///old/index.html".into(), "client".into());
	registry.upsert(local);
	let catalog = Arc::new(StaticCatalog::new(vec![
		MicroApp::new("wallet").with_version(AppVersion::new("1.1.0", "https://cdn/w-1.1.0.zip")),
	]));
	let fetcher = Arc::new(CountingFetcher::default());
	let manager = manager(dir.path(), registry.clone(), fetcher.clone()).with_catalog(catalog);

	// Act
	let first = manager.sync_catalog().await.unwrap();
	let second = manager.sync_catalog().await.unwrap();

	// Assert
	assert_eq!(first.updates, vec!["wallet".to_string()]);
	assert!(second.updates.is_empty());
	assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
	let app = registry.get("wallet").unwrap();
	assert_eq!(app.latest_version(), Some("1.1.0"));
	assert!(app.web_view_uri.ends_with("/wallet-extracted/index.html"));
}

#[rstest]
#[tokio::test]
async fn test_queue_continues_past_failed_item() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let registry = open_registry(dir.path()).await;
	let fetcher = Arc::new(CountingFetcher::default());
	let manager = manager(dir.path(), registry.clone(), fetcher.clone());
	for (id, url) in [("a", "https://cdn/a.zip"), ("b", "https://cdn/fail.zip"), ("c", "https://cdn/c.zip")] {
		manager.queue().try_enqueue(InstallRequest::new(id, url));
	}

	// Act
	let report = manager.process_queue().await.unwrap();

	// Assert
	assert_eq!(report.installed, vec!["a".to_string(), "c".to_string()]);
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].0, "b");
	assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
	assert!(registry.get("c").unwrap().is_downloaded());
	assert!(manager.queue().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_request_install_dedups_while_queued() {
	let dir = TempDir::new().unwrap();
	let registry = open_registry(dir.path()).await;
	let manager = manager(dir.path(), registry.clone(), Arc::default());

	let first = manager.enqueue_install("a", Some("https://cdn/a.zip")).unwrap();
	let second = manager.request_install("a", Some("https://cdn/a.zip")).unwrap();

	assert!(first.is_queued());
	assert!(!second.is_queued());
}
