//! # Core Configuration Module
//!
//! Provides configuration management for the Spotify core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core
//! library. It enforces fail-fast validation to ensure all required bridges
//! are provided before initialization. There are no global defaults: the host
//! composes one config, builds one service from it, and owns the instance.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Required for session persistence
//! - `HttpClient` - Required for Web API calls
//! - `AuthGateway` - Required for the interactive login flow
//!
//! ## Optional Dependencies
//!
//! - `StreamingBackend` - Playback; without it the player surface is inert
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .client_id("my-client-id")
//!     .redirect_uri("myapp://callback")
//!     .settings_store(Arc::new(MySettingsStore))
//!     .http_client(Arc::new(MyHttpClient))
//!     .auth_gateway(Arc::new(MyAuthGateway))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable
//! error messages when capabilities are missing.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AuthGateway, HttpClient, SettingsStore, StreamingBackend};
use std::sync::Arc;

/// Default OAuth scopes requested when the host does not override them.
///
/// Covers profile reads (premium check), library/playlist reads, and the
/// streaming scope the playback SDK requires.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-library-read",
    "playlist-read-private",
    "streaming",
];

/// Core configuration for the Spotify core.
///
/// This struct holds all dependencies and settings required to initialize
/// the core library. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// OAuth client ID
    pub client_id: String,

    /// Redirect URI the platform delivers auth callbacks to
    pub redirect_uri: String,

    /// OAuth scopes to request during login
    pub scopes: Vec<String>,

    /// Settings storage for session persistence (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// HTTP client for Web API requests (required)
    pub http_client: Arc<dyn HttpClient>,

    /// Platform auth gateway for the interactive flow (required)
    pub auth_gateway: Arc<dyn AuthGateway>,

    /// Platform streaming controller (optional)
    pub streaming_backend: Option<Arc<dyn StreamingBackend>>,

    /// Event bus buffer size per async subscriber
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("settings_store", &"SettingsStore { ... }")
            .field("http_client", &"HttpClient { ... }")
            .field("auth_gateway", &"AuthGateway { ... }")
            .field(
                "streaming_backend",
                &self
                    .streaming_backend
                    .as_ref()
                    .map(|_| "StreamingBackend { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Client ID and redirect URI are not empty
    /// - Redirect URI carries a scheme
    /// - At least one scope is requested
    /// - Event buffer size is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::Config("Client ID cannot be empty".to_string()));
        }

        if self.redirect_uri.is_empty() {
            return Err(Error::Config("Redirect URI cannot be empty".to_string()));
        }

        if !self.redirect_uri.contains("://") {
            return Err(Error::Config(
                "Redirect URI must carry a scheme (e.g. 'myapp://callback')".to_string(),
            ));
        }

        if self.scopes.is_empty() {
            return Err(Error::Config(
                "At least one OAuth scope is required".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for session persistence. \
                 Desktop: inject SqliteSettingsStore from bridge-desktop. \
                 Mobile: inject platform-native settings (UserDefaults/SharedPreferences)."
            .to_string(),
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for Web API access. \
                 Desktop: inject ReqwestHttpClient from bridge-desktop. \
                 Mobile: inject a platform-native HTTP stack."
            .to_string(),
    }
}

fn auth_gateway_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AuthGateway".to_string(),
        message: "AuthGateway implementation is required for the login flow. \
                 Desktop: inject BrowserAuthGateway from bridge-desktop. \
                 Mobile: inject the vendor SDK's login controller adapter."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
/// The builder validates required dependencies and provides helpful error
/// messages.
#[derive(Default)]
pub struct CoreConfigBuilder {
    client_id: Option<String>,
    redirect_uri: Option<String>,
    scopes: Option<Vec<String>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    auth_gateway: Option<Arc<dyn AuthGateway>>,
    streaming_backend: Option<Arc<dyn StreamingBackend>>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the OAuth client ID (required).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the redirect URI the platform delivers callbacks to (required).
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Overrides the OAuth scopes requested during login.
    ///
    /// Default: [`DEFAULT_SCOPES`].
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the settings store implementation (required).
    ///
    /// The settings store persists the session blob between launches.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the HTTP client implementation (required).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the auth gateway implementation (required).
    pub fn auth_gateway(mut self, gateway: Arc<dyn AuthGateway>) -> Self {
        self.auth_gateway = Some(gateway);
        self
    }

    /// Sets the streaming backend implementation (optional).
    ///
    /// Without one, the player surface reports
    /// [`Error::CapabilityMissing`](crate::error::Error) when activated.
    pub fn streaming_backend(mut self, backend: Arc<dyn StreamingBackend>) -> Self {
        self.streaming_backend = Some(backend);
        self
    }

    /// Overrides the event bus buffer size.
    ///
    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`].
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (SettingsStore, HttpClient, AuthGateway)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config("Client ID is required. Use .client_id() to set it.".to_string())
        })?;

        let redirect_uri = self.redirect_uri.ok_or_else(|| {
            Error::Config("Redirect URI is required. Use .redirect_uri() to set it.".to_string())
        })?;

        let settings_store = self.settings_store.ok_or_else(settings_store_missing_error)?;
        let http_client = self.http_client.ok_or_else(http_client_missing_error)?;
        let auth_gateway = self.auth_gateway.ok_or_else(auth_gateway_missing_error)?;

        let config = CoreConfig {
            client_id,
            redirect_uri,
            scopes: self
                .scopes
                .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()),
            settings_store,
            http_client,
            auth_gateway,
            streaming_backend: self.streaming_backend,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        AuthGateway, BridgeError, HttpClient, HttpRequest, HttpResponse, LoginRequest,
        SettingsStore, TokenGrant,
    };
    use std::sync::Arc;

    // Mock implementations for testing
    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(
            &self,
            _key: &str,
            _value: &str,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("mock".to_string()))
        }
    }

    struct MockAuthGateway;

    #[async_trait]
    impl AuthGateway for MockAuthGateway {
        async fn launch_login(
            &self,
            _request: &LoginRequest,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn exchange_callback(
            &self,
            _url: &str,
        ) -> std::result::Result<TokenGrant, BridgeError> {
            Err(BridgeError::NotAvailable("mock".to_string()))
        }

        async fn renew(&self, _refresh_token: &str) -> std::result::Result<TokenGrant, BridgeError> {
            Err(BridgeError::NotAvailable("mock".to_string()))
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .client_id("test-client")
            .redirect_uri("myapp://callback")
            .settings_store(Arc::new(MockSettingsStore))
            .http_client(Arc::new(MockHttpClient))
            .auth_gateway(Arc::new(MockAuthGateway))
    }

    #[test]
    fn test_builder_requires_client_id() {
        let result = CoreConfig::builder()
            .redirect_uri("myapp://callback")
            .settings_store(Arc::new(MockSettingsStore))
            .http_client(Arc::new(MockHttpClient))
            .auth_gateway(Arc::new(MockAuthGateway))
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Client ID is required"));
    }

    #[test]
    fn test_builder_requires_redirect_uri() {
        let result = CoreConfig::builder()
            .client_id("test-client")
            .settings_store(Arc::new(MockSettingsStore))
            .http_client(Arc::new(MockHttpClient))
            .auth_gateway(Arc::new(MockAuthGateway))
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Redirect URI is required"));
    }

    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .client_id("test-client")
            .redirect_uri("myapp://callback")
            .http_client(Arc::new(MockHttpClient))
            .auth_gateway(Arc::new(MockAuthGateway))
            .build();

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SettingsStore"));
        assert!(err_msg.contains("session persistence"));
    }

    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder()
            .client_id("test-client")
            .redirect_uri("myapp://callback")
            .settings_store(Arc::new(MockSettingsStore))
            .auth_gateway(Arc::new(MockAuthGateway))
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HttpClient"));
    }

    #[test]
    fn test_builder_requires_auth_gateway() {
        let result = CoreConfig::builder()
            .client_id("test-client")
            .redirect_uri("myapp://callback")
            .settings_store(Arc::new(MockSettingsStore))
            .http_client(Arc::new(MockHttpClient))
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("AuthGateway"));
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.client_id, "test-client");
        assert_eq!(config.redirect_uri, "myapp://callback");
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert!(config.streaming_backend.is_none());
        assert!(!config.scopes.is_empty()); // Default scopes
    }

    #[test]
    fn test_builder_with_custom_scopes() {
        let config = complete_builder()
            .scopes(vec!["streaming".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.scopes, vec!["streaming".to_string()]);
    }

    #[test]
    fn test_validate_rejects_empty_scopes() {
        let result = complete_builder().scopes(Vec::new()).build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("At least one OAuth scope"));
    }

    #[test]
    fn test_validate_rejects_schemeless_redirect_uri() {
        let result = complete_builder().redirect_uri("callback").build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must carry a scheme"));
    }

    #[test]
    fn test_validate_rejects_zero_buffer_size() {
        let result = complete_builder().event_buffer_size(0).build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = complete_builder().build().unwrap();

        let cloned = config.clone();
        assert_eq!(cloned.client_id, config.client_id);
        assert_eq!(cloned.event_buffer_size, config.event_buffer_size);
    }

    #[test]
    fn test_debug_does_not_leak_bridge_internals() {
        let config = complete_builder().build().unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("test-client"));
        assert!(debug.contains("SettingsStore { ... }"));
    }
}
