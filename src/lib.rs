//! # Superapp
//!
//! Host shell for micro-apps: independently packaged web bundles that run in
//! an embedded browser view and reach native capabilities through a message
//! bridge.
//!
//! ## Crates
//!
//! - [`bridge`]: envelope codec, injected runtime, host dispatcher and the
//!   built-in topic handlers
//! - [`auth`]: session tokens, single-flight refresh, refresh-and-retry and
//!   token exchange
//! - [`packages`]: catalog, install pipeline and install queue
//! - [`conf`]: layered shell settings
//!
//! ## Feature Flags
//!
//! - `host` (default): [`MicroAppHost`], which wires all of the above
//! - `auth`, `packages`, `conf`: re-export the corresponding crate
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use superapp::prelude::*;
//!
//! let settings = ShellSettings::builder().file("shell.toml").build()?;
//! let host = MicroAppHost::open(settings, auth).await?;
//! host.packages().sync_catalog().await?;
//!
//! let screen = host.open_screen("wallet", Arc::new(sink))?;
//! web_view.inject(&host.runtime_script());
//! web_view.load(screen.web_view_uri());
//! host.exchange_and_deliver_token(&screen).await?;
//! ```

pub use superapp_bridge as bridge;

#[cfg(feature = "auth")]
pub use superapp_auth as auth;

#[cfg(feature = "conf")]
pub use superapp_conf as conf;

#[cfg(feature = "packages")]
pub use superapp_packages as packages;

#[cfg(feature = "host")]
pub mod error;
#[cfg(feature = "host")]
pub mod shell;

#[cfg(feature = "host")]
pub use error::{ShellError, ShellResult};
#[cfg(feature = "host")]
pub use shell::{MicroAppHost, MicroAppScreen};

/// Commonly used types.
pub mod prelude {
	pub use superapp_bridge::prelude::*;

	#[cfg(feature = "auth")]
	pub use superapp_auth::{AuthError, AuthManager, SessionTokens};

	#[cfg(feature = "conf")]
	pub use superapp_conf::ShellSettings;

	#[cfg(feature = "packages")]
	pub use superapp_packages::{MicroApp, PackageError, PackageManager};

	#[cfg(feature = "host")]
	pub use crate::{MicroAppHost, MicroAppScreen, ShellError};
}
