//! # Desktop Bridge Implementations
//!
//! Desktop (Windows/macOS/Linux) implementations of the platform capability
//! traits defined in `bridge-traits`:
//!
//! - [`ReqwestHttpClient`]: HTTP transport via reqwest with retry support
//! - [`SqliteSettingsStore`]: persistent key-value settings via SQLite
//! - [`BrowserAuthGateway`]: OAuth 2.0 + PKCE login through the system browser
//!
//! These adapters are selected at composition time; the core crates only see
//! the trait objects.

pub mod auth;
pub mod http;
pub mod settings;

pub use auth::BrowserAuthGateway;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
