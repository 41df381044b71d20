//! Shell authentication.
//!
//! Token acquisition itself (OAuth flows, the trust broker behind token
//! exchange) lives behind the [`TokenRefresher`] and [`TokenExchanger`]
//! traits. This crate owns what sits on top of them:
//!
//! - the session store,
//! - single-flight refresh ([`SingleFlight`]),
//! - refresh-and-retry-once with forced logout ([`AuthManager::call_with_refresh`]).

pub mod error;
pub mod exchange;
pub mod manager;
pub mod session;
pub mod single_flight;

pub use error::{AuthError, AuthResult};
pub use exchange::{LogoutListener, TokenExchanger, TokenRefresher};
pub use manager::AuthManager;
pub use session::{MemorySessionStore, SessionStore, SessionTokens};
pub use single_flight::SingleFlight;
