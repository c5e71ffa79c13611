//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and platform-specific
//! implementations. Each trait represents a capability the core requires but that
//! must be implemented differently per platform (desktop, iOS, Android):
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//! - [`SettingsStore`](settings::SettingsStore) - Durable key-value preferences storage
//! - [`AuthGateway`](auth::AuthGateway) - Interactive login, code exchange, token renewal
//! - [`StreamingBackend`](streaming::StreamingBackend) - Native streaming controller
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing; see `core_runtime::config::CoreConfig` for how bridges are wired in.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError` and
//! provide actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod auth;
pub mod error;
pub mod http;
pub mod settings;
pub mod streaming;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{AuthGateway, LoginRequest, TokenGrant};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use settings::SettingsStore;
pub use streaming::{StreamingBackend, TrackMetadata};
