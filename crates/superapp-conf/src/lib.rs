//! Configuration for the super-app shell.
//!
//! Settings are assembled from layers: built-in defaults, an optional TOML
//! file, a `.env` file and `SUPERAPP_*` environment variables.
//!
//! ```toml
//! documents_root = "/var/lib/superapp"
//! catalog_url = "https://apps.example.com/api/micro-apps"
//! download_timeout_secs = 60
//! ```

pub mod env;
pub mod error;
pub mod settings;

pub use env::{DEFAULT_PREFIX, Env};
pub use error::{SettingsError, SettingsResult};
pub use settings::{KEYS, SettingsBuilder, ShellSettings};
