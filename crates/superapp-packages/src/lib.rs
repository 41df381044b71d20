//! Micro-app packages: catalog, install pipeline and install queue.
//!
//! A micro-app is a zip archive whose root (or `build/` folder) holds an
//! `index.html` entry point and a `microapp.json` manifest declaring its
//! `clientId`. Installed packages live under
//! `<documents_root>/wso2/micro-apps/`:
//!
//! ```text
//! wallet.zip
//! wallet-extracted/
//!     index.html
//!     microapp.json
//! ```
//!
//! [`PackageManager`] is the usual entry point: it owns the
//! [`PackageRegistry`], feeds the serialized [`InstallQueue`] and keeps the
//! catalog in line with a remote [`CatalogSource`].

pub mod catalog;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod installer;
pub mod layout;
pub mod manager;
pub mod manifest;
pub mod model;
pub mod queue;
pub mod reconcile;
pub mod registry;
pub mod vault;

pub use catalog::{CatalogSource, HttpCatalogSource, StaticCatalog};
pub use error::{PackageError, PackageResult};
pub use extract::{ExtractSummary, extract_archive, is_metadata_entry};
pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use installer::{InstallAlerts, InstallPhase, Installer, LogAlerts};
pub use layout::{ENTRY_CANDIDATES, MANIFEST_CANDIDATES, PackageLayout};
pub use manager::{PackageManager, SyncReport};
pub use manifest::MicroAppManifest;
pub use model::{AppVersion, InstallStatus, MicroApp};
pub use queue::{EnqueueOutcome, InstallQueue, InstallRequest, QueueReport};
pub use reconcile::{ReconcileOutcome, reconcile};
pub use registry::PackageRegistry;
pub use vault::{FileTokenVault, MemoryTokenVault, TokenVault};
