//! Wiring of micro-app screens to packages, auth and the bridge.

use std::sync::Arc;

use superapp_auth::AuthManager;
use superapp_bridge::{
	DispatchOutcome, FileLocalStore, GuestSink, HeadlessDialogs, HostDispatcher, HostServices,
	RuntimeGenerator, ScreenState, UnconfiguredDrive,
};
use superapp_conf::ShellSettings;
use superapp_packages::{
	FileTokenVault, HttpCatalogSource, HttpFetcher, Installer, MicroApp, PackageLayout,
	PackageManager, PackageRegistry,
};

use crate::error::{ShellError, ShellResult};

/// The host side of the shell: installed packages, the session, and the
/// bridge collaborators shared by every micro-app screen.
pub struct MicroAppHost {
	settings: ShellSettings,
	packages: Arc<PackageManager>,
	auth: Arc<AuthManager>,
	dispatcher: HostDispatcher,
	services: HostServices,
}

impl MicroAppHost {
	/// Opens the host described by `settings`.
	///
	/// Loads the persisted catalog, stores tokens and local data under the
	/// document root, and syncs against `catalog_url` when one is set.
	pub async fn open(settings: ShellSettings, auth: Arc<AuthManager>) -> ShellResult<Self> {
		let vault = Arc::new(FileTokenVault::new(settings.token_vault_file()));
		let registry = Arc::new(PackageRegistry::open(settings.catalog_file(), vault).await?);
		let fetcher = Arc::new(HttpFetcher::new(settings.download_timeout())?);
		let installer = Installer::new(
			PackageLayout::new(&settings.documents_root),
			registry,
			fetcher,
		);

		let mut packages = PackageManager::new(installer);
		if let Some(url) = settings.catalog_url() {
			let source = HttpCatalogSource::new(url, settings.download_timeout())?
				.with_auth(auth.clone());
			packages = packages.with_catalog(Arc::new(source));
		}

		let services = HostServices::new(
			Arc::new(FileLocalStore::new(settings.local_data_dir())),
			Arc::new(HeadlessDialogs::default()),
			Arc::new(UnconfiguredDrive),
		);
		Ok(Self::from_parts(settings, Arc::new(packages), auth).with_services(services))
	}

	/// Assembles a host from already built parts with headless services.
	pub fn from_parts(
		settings: ShellSettings,
		packages: Arc<PackageManager>,
		auth: Arc<AuthManager>,
	) -> Self {
		Self {
			settings,
			packages,
			auth,
			dispatcher: HostDispatcher::default(),
			services: HostServices::headless(),
		}
	}

	/// Replaces the collaborators handed to bridge handlers.
	pub fn with_services(mut self, services: HostServices) -> Self {
		self.services = services;
		self
	}

	/// Replaces the dispatcher, e.g. to override built-in handlers.
	pub fn with_dispatcher(mut self, dispatcher: HostDispatcher) -> Self {
		self.dispatcher = dispatcher;
		self
	}

	/// Settings the host was opened with.
	pub fn settings(&self) -> &ShellSettings {
		&self.settings
	}

	/// Package manager.
	pub fn packages(&self) -> &Arc<PackageManager> {
		&self.packages
	}

	/// Session manager.
	pub fn auth(&self) -> &Arc<AuthManager> {
		&self.auth
	}

	/// Script to inject into guest pages before their own code runs.
	pub fn runtime_script(&self) -> String {
		RuntimeGenerator::new()
			.namespace(self.settings.bridge_namespace.clone())
			.transport(self.settings.bridge_transport.clone())
			.generate()
	}

	/// Opens the screen of an installed micro-app.
	///
	/// Settlements for the screen's guest go to `sink`.
	pub fn open_screen(&self, app_id: &str, sink: Arc<dyn GuestSink>) -> ShellResult<MicroAppScreen> {
		let app = self
			.packages
			.registry()
			.get(app_id)
			.filter(MicroApp::is_downloaded)
			.ok_or_else(|| ShellError::NotInstalled(app_id.to_string()))?;

		let state = ScreenState::builder(app_id, sink, self.services.clone()).build();
		tracing::info!(app_id = %app_id, uri = %app.web_view_uri, "micro-app screen opened");
		Ok(MicroAppScreen {
			app,
			state,
			dispatcher: self.dispatcher.clone(),
		})
	}

	/// Exchanges the session token for the screen app's own token, stores it
	/// and releases the screen's waiting `token` requests.
	///
	/// Returns the number of requests released.
	pub async fn exchange_and_deliver_token(&self, screen: &MicroAppScreen) -> ShellResult<usize> {
		let app_id = screen.app().app_id.as_str();
		let token = self.auth.exchange_token(&screen.app().client_id).await?;
		self.packages.registry().set_token(app_id, &token).await?;

		let released = screen.state().deliver_token(token);
		tracing::debug!(app_id = %app_id, released, "app token delivered");
		Ok(released)
	}
}

impl std::fmt::Debug for MicroAppHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MicroAppHost")
			.field("settings", &self.settings)
			.field("packages", &self.packages)
			.finish()
	}
}

/// One open micro-app screen.
pub struct MicroAppScreen {
	app: MicroApp,
	state: ScreenState,
	dispatcher: HostDispatcher,
}

impl MicroAppScreen {
	/// The app as it was when the screen opened.
	pub fn app(&self) -> &MicroApp {
		&self.app
	}

	/// Entry point to load into the web view.
	pub fn web_view_uri(&self) -> &str {
		&self.app.web_view_uri
	}

	/// Bridge state of the screen.
	pub fn state(&self) -> &ScreenState {
		&self.state
	}

	/// Handles one raw message posted by the guest.
	pub fn handle_message(&self, raw: &str) -> DispatchOutcome {
		self.dispatcher.dispatch(raw, &self.state)
	}

	/// Completes a pending QR scan.
	pub fn complete_scan(&self, scanned: &str) -> bool {
		self.state.scanner().complete(scanned)
	}

	/// Cancels a pending QR scan.
	pub fn cancel_scan(&self) -> bool {
		self.state.scanner().cancel()
	}

	/// Closes the screen; later settlements are discarded.
	pub fn close(&self) {
		self.state.unmount();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use rstest::rstest;
	use superapp_auth::{
		AuthResult, MemorySessionStore, SessionTokens, TokenExchanger, TokenRefresher,
	};
	use superapp_bridge::{ChannelSink, Settlement};
	use superapp_packages::{AppVersion, LogAlerts, StaticCatalog};
	use tempfile::TempDir;

	struct NeverRefresh;

	#[async_trait]
	impl TokenRefresher for NeverRefresh {
		async fn refresh(&self, _refresh_token: &str) -> AuthResult<SessionTokens> {
			Err(superapp_auth::AuthError::Refresh("offline".into()))
		}
	}

	struct PrefixExchanger;

	#[async_trait]
	impl TokenExchanger for PrefixExchanger {
		async fn exchange(&self, access_token: &str, client_id: &str) -> AuthResult<String> {
			Ok(format!("{}:{}", client_id, access_token))
		}
	}

	fn host(dir: &TempDir, apps: Vec<MicroApp>) -> MicroAppHost {
		let settings = ShellSettings {
			documents_root: dir.path().to_path_buf(),
			..ShellSettings::default()
		};
		let registry = Arc::new(PackageRegistry::with_apps(apps));
		let installer = Installer::new(
			PackageLayout::new(dir.path()),
			registry,
			Arc::new(HttpFetcher::new(settings.download_timeout()).unwrap()),
		)
		.with_alerts(Arc::new(LogAlerts));
		let packages = PackageManager::new(installer).with_catalog(Arc::new(StaticCatalog::default()));
		let auth = AuthManager::new(
			Arc::new(MemorySessionStore::with_tokens(SessionTokens::new("shell-token"))),
			Arc::new(NeverRefresh),
		)
		.with_exchanger(Arc::new(PrefixExchanger));
		MicroAppHost::from_parts(settings, Arc::new(packages), Arc::new(auth))
	}

	fn installed_wallet() -> MicroApp {
		let mut app = MicroApp::new("wallet").with_version(AppVersion::new("1.0.0", "u"));
		app.mark_installed("file:///apps/wallet/index.html".into(), "wallet-client".into());
		app
	}

	#[rstest]
	fn test_open_screen_requires_install() {
		let dir = TempDir::new().unwrap();
		let host = host(&dir, vec![MicroApp::new("notes")]);
		let (sink, _rx) = ChannelSink::new();

		let result = host.open_screen("notes", Arc::new(sink));

		assert!(matches!(result, Err(ShellError::NotInstalled(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_token_exchange_releases_waiting_requests() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let host = host(&dir, vec![installed_wallet()]);
		let (sink, mut rx) = ChannelSink::new();
		let screen = host.open_screen("wallet", Arc::new(sink)).unwrap();
		screen
			.handle_message(r#"{"topic":"token","data":null,"requestId":"t-1"}"#)
			.join()
			.await;

		// Act
		let released = host.exchange_and_deliver_token(&screen).await.unwrap();

		// Assert
		assert_eq!(released, 1);
		let callback = rx.recv().await.unwrap();
		assert_eq!(callback.request_id.as_str(), "t-1");
		assert_eq!(
			callback.settlement,
			Settlement::Resolved(serde_json::json!("wallet-client:shell-token"))
		);
		assert_eq!(
			host.packages().registry().token("wallet").await.unwrap().as_deref(),
			Some("wallet-client:shell-token")
		);
	}

	#[rstest]
	fn test_runtime_uses_configured_namespace() {
		let dir = TempDir::new().unwrap();
		let mut host = host(&dir, Vec::new());
		host.settings.bridge_namespace = "shellbridge".into();

		assert!(host.runtime_script().contains("window.shellbridge"));
	}
}
