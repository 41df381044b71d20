//! Super-app shell CLI
//!
//! Drives the shell headlessly: inspect the bridge protocol, manage installed
//! micro-apps and feed single envelopes to the host dispatcher.
//!
//! ## Usage
//!
//! ```bash
//! superapp topics
//! superapp runtime --namespace nativebridge
//! superapp --config shell.toml sync
//! superapp install wallet --url https://cdn.example.com/wallet.zip
//! superapp dispatch '{"topic":"get_local_data","data":{"key":"k"},"requestId":"1"}'
//! ```

mod logging;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use superapp::MicroAppHost;
use superapp_auth::{AuthError, AuthManager, AuthResult, MemorySessionStore, SessionTokens, TokenRefresher};
use superapp_bridge::{
	BridgeTopic, FileLocalStore, HeadlessDialogs, HostDispatcher, HostServices, RuntimeGenerator,
	ScreenState, ScriptSink, TopicRegistry, UnconfiguredDrive,
};
use superapp_conf::ShellSettings;
use superapp_packages::{EnqueueOutcome, InstallStatus};

#[derive(Parser)]
#[command(name = "superapp")]
#[command(about = "Super-app shell utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (TOML)
	#[arg(short, long, global = true, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Shell access token used for catalog requests
	#[arg(long, global = true, value_name = "TOKEN")]
	access_token: Option<String>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// List bridge topics and their generated method names
	Topics,

	/// Print the script injected into guest pages
	Runtime {
		/// Global object name (defaults to the configured namespace)
		#[arg(long)]
		namespace: Option<String>,

		/// Guest to host transport expression
		#[arg(long)]
		transport: Option<String>,
	},

	/// List known micro-apps
	List,

	/// Install or update a micro-app
	Install {
		/// Micro-app id
		#[arg(value_name = "APP_ID")]
		app_id: String,

		/// Archive location (defaults to the catalog's newest version)
		#[arg(long)]
		url: Option<String>,
	},

	/// Remove an installed micro-app
	Remove {
		/// Micro-app id
		#[arg(value_name = "APP_ID")]
		app_id: String,
	},

	/// Fetch the remote catalog and install updates
	Sync,

	/// Dispatch one raw envelope and print the scripts sent back to the guest
	Dispatch {
		/// Raw envelope JSON
		#[arg(value_name = "ENVELOPE")]
		raw: String,

		/// Micro-app the envelope comes from
		#[arg(long, default_value = "cli")]
		app_id: String,

		/// App token to deliver before dispatching
		#[arg(long)]
		token: Option<String>,
	},
}

/// The CLI holds no refresh token; an expired session means signing in again.
struct NoRefresh;

#[async_trait]
impl TokenRefresher for NoRefresh {
	async fn refresh(&self, _refresh_token: &str) -> AuthResult<SessionTokens> {
		Err(AuthError::Refresh("the CLI cannot refresh sessions".to_string()))
	}
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	let settings = match load_settings(cli.config.as_ref()) {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("{} {:#}", "Error:".red().bold(), e);
			process::exit(1);
		}
	};
	logging::init(&settings.log_filter, cli.verbosity);

	let result = match cli.command {
		Commands::Topics => {
			run_topics();
			Ok(())
		}
		Commands::Runtime {
			namespace,
			transport,
		} => {
			run_runtime(&settings, namespace, transport);
			Ok(())
		}
		Commands::List => run_list(settings, cli.access_token).await,
		Commands::Install { app_id, url } => {
			run_install(settings, cli.access_token, app_id, url).await
		}
		Commands::Remove { app_id } => run_remove(settings, cli.access_token, app_id).await,
		Commands::Sync => run_sync(settings, cli.access_token).await,
		Commands::Dispatch { raw, app_id, token } => {
			run_dispatch(&settings, &raw, app_id, token).await
		}
	};

	if let Err(e) = result {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

fn load_settings(config: Option<&PathBuf>) -> anyhow::Result<ShellSettings> {
	let mut builder = ShellSettings::builder();
	if let Some(path) = config {
		builder = builder.file(path);
	}
	builder.build().context("failed to load settings")
}

async fn open_host(settings: ShellSettings, access_token: Option<String>) -> anyhow::Result<MicroAppHost> {
	let store = match access_token {
		Some(token) => MemorySessionStore::with_tokens(SessionTokens::new(token)),
		None => MemorySessionStore::new(),
	};
	let auth = AuthManager::new(Arc::new(store), Arc::new(NoRefresh));
	MicroAppHost::open(settings, Arc::new(auth))
		.await
		.context("failed to open the package registry")
}

fn run_topics() {
	println!("{}", "Bridge topics:".bold());
	for descriptor in TopicRegistry::descriptors() {
		let marker = if descriptor.settles {
			"".normal()
		} else {
			" (fire-and-forget)".dimmed()
		};
		println!(
			"  {:<28} {} / {} / {} / {}{}",
			descriptor.topic.as_str().cyan(),
			descriptor.methods.request,
			descriptor.methods.resolve,
			descriptor.methods.reject,
			descriptor.methods.get,
			marker
		);
	}
}

fn run_runtime(settings: &ShellSettings, namespace: Option<String>, transport: Option<String>) {
	let generator = RuntimeGenerator::new()
		.namespace(namespace.unwrap_or_else(|| settings.bridge_namespace.clone()))
		.transport(transport.unwrap_or_else(|| settings.bridge_transport.clone()));
	println!("{}", generator.generate());
}

async fn run_list(settings: ShellSettings, access_token: Option<String>) -> anyhow::Result<()> {
	let host = open_host(settings, access_token).await?;
	let apps = host.packages().apps();
	if apps.is_empty() {
		println!("{}", "No micro-apps in the catalog. Run `superapp sync` first.".yellow());
		return Ok(());
	}

	for app in apps {
		let status = match app.status {
			InstallStatus::Downloaded => app.status.as_str().green(),
			InstallStatus::NotDownloaded => app.status.as_str().dimmed(),
		};
		println!(
			"  {:<24} {:<10} {:<16} {}",
			app.app_id.cyan(),
			app.latest_version().unwrap_or("-"),
			status,
			app.name
		);
	}
	Ok(())
}

async fn run_install(
	settings: ShellSettings,
	access_token: Option<String>,
	app_id: String,
	url: Option<String>,
) -> anyhow::Result<()> {
	let host = open_host(settings, access_token).await?;
	let outcome = host.packages().enqueue_install(&app_id, url.as_deref())?;
	if outcome == EnqueueOutcome::AlreadyDownloading {
		println!("{} is already being installed", app_id.cyan());
		return Ok(());
	}

	let report = host.packages().process_queue().await.unwrap_or_default();
	for installed in &report.installed {
		println!("{} {}", "Installed".green().bold(), installed.cyan());
	}
	for (failed, reason) in &report.failed {
		println!("{} {}: {}", "Failed".red().bold(), failed.cyan(), reason);
	}
	if report.failed.is_empty() {
		Ok(())
	} else {
		anyhow::bail!("{} install(s) failed", report.failed.len())
	}
}

async fn run_remove(settings: ShellSettings, access_token: Option<String>, app_id: String) -> anyhow::Result<()> {
	let host = open_host(settings, access_token).await?;
	host.packages().remove(&app_id).await?;
	println!("{} {}", "Removed".green().bold(), app_id.cyan());
	Ok(())
}

async fn run_sync(settings: ShellSettings, access_token: Option<String>) -> anyhow::Result<()> {
	let host = open_host(settings, access_token).await?;
	let report = host
		.packages()
		.sync_catalog()
		.await
		.context("catalog sync failed")?;

	println!(
		"{} {} added, {} dropped, {} update(s) queued",
		"Synchronized:".green().bold(),
		report.added.len(),
		report.dropped.len(),
		report.updates.len()
	);
	if let Some(queue) = report.queue {
		for (failed, reason) in queue.failed {
			println!("{} {}: {}", "Update failed".red().bold(), failed.cyan(), reason);
		}
	}
	Ok(())
}

async fn run_dispatch(
	settings: &ShellSettings,
	raw: &str,
	app_id: String,
	token: Option<String>,
) -> anyhow::Result<()> {
	let services = HostServices::new(
		Arc::new(FileLocalStore::new(settings.local_data_dir())),
		Arc::new(HeadlessDialogs::default()),
		Arc::new(UnconfiguredDrive),
	);
	let sink = ScriptSink::new(settings.bridge_namespace.clone(), |script| println!("{}", script));
	let screen = ScreenState::builder(app_id, Arc::new(sink), services).build();
	if let Some(token) = token {
		screen.deliver_token(token);
	}

	let outcome = HostDispatcher::default().dispatch(raw, &screen);
	if outcome.is_dropped() {
		anyhow::bail!("message dropped: {:?}", outcome);
	}
	outcome.join().await;

	if let Ok(envelope) = superapp_bridge::BridgeEnvelope::decode(raw) {
		let parked = BridgeTopic::from_wire(&envelope.topic) == Some(BridgeTopic::Token)
			&& screen.token_gate().waiting() > 0;
		if parked {
			eprintln!("{}", "token request is waiting for --token".yellow());
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;
	use rstest::rstest;

	#[rstest]
	fn test_cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[rstest]
	#[case(&["superapp", "install", "wallet", "--url", "https://x/w.zip"])]
	#[case(&["superapp", "-vv", "--config", "shell.toml", "sync"])]
	#[case(&["superapp", "dispatch", "{}", "--app-id", "wallet", "--token", "t"])]
	fn test_parses_commands(#[case] args: &[&str]) {
		assert!(Cli::try_parse_from(args).is_ok());
	}
}
