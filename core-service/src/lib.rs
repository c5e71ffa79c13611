//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP transport,
//! settings storage, the interactive OAuth surface, optionally a streaming
//! controller) into the shared Spotify core. Desktop apps typically enable
//! the `desktop-shims` feature, which re-exports the adapters from
//! `bridge-desktop`; mobile embedders pass their own bridge handles through
//! [`CoreConfig`].
//!
//! # Usage
//!
//! ```ignore
//! use core_runtime::CoreConfig;
//! use core_service::SpotifyService;
//!
//! let config = CoreConfig::builder()
//!     .client_id("abc")
//!     .redirect_uri("myapp://callback")
//!     .settings_store(settings)
//!     .http_client(http)
//!     .auth_gateway(gateway)
//!     .build()?;
//!
//! let service = SpotifyService::new(config)?;
//! service.coordinator().login().await?;
//! // ... when the OS delivers the redirect URL:
//! service.handle_redirect(&url).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{BrowserAuthGateway, ReqwestHttpClient, SqliteSettingsStore};

use core_catalog::CatalogClient;
use core_playback::PlayerFacade;
use core_runtime::events::{EventBus, Receiver};
use core_runtime::{CoreConfig, CoreEvent};
use core_session::SessionCoordinator;
use std::sync::Arc;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
///
/// Owns the event bus and the wired core components. Cheap to clone; all
/// clones share the same coordinator, catalog client, and player.
#[derive(Clone)]
pub struct SpotifyService {
    event_bus: EventBus,
    coordinator: Arc<SessionCoordinator>,
    catalog: Arc<CatalogClient>,
    player: Option<Arc<PlayerFacade>>,
}

impl SpotifyService {
    /// Wires the core from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration error when `config` is incomplete or
    /// inconsistent; nothing is constructed in that case.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);

        let coordinator = Arc::new(SessionCoordinator::new(
            config.settings_store.clone(),
            config.auth_gateway.clone(),
            config.http_client.clone(),
            event_bus.clone(),
            config.client_id.clone(),
            config.redirect_uri.clone(),
            config.scopes.clone(),
        ));

        let catalog = Arc::new(CatalogClient::new(
            config.http_client.clone(),
            coordinator.clone(),
        ));

        let player = config.streaming_backend.as_ref().map(|backend| {
            Arc::new(PlayerFacade::new(
                coordinator.clone(),
                backend.clone(),
                event_bus.clone(),
            ))
        });

        info!(
            has_player = player.is_some(),
            "Spotify core service assembled"
        );

        Ok(Self {
            event_bus,
            coordinator,
            catalog,
            player,
        })
    }

    /// Platform redirect entry point.
    ///
    /// Hosts call this for every URL the OS delivers (custom-scheme redirect,
    /// activity intent); URLs unrelated to the login flow return `Ok(false)`
    /// with no side effects.
    #[instrument(skip(self, url))]
    pub async fn handle_redirect(&self, url: &str) -> Result<bool> {
        Ok(self.coordinator.handle_auth_callback(url).await?)
    }

    /// Subscribes to the core event stream.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// The shared event bus, for registering synchronous listeners.
    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// The session coordinator.
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    /// The catalog client.
    pub fn catalog(&self) -> &Arc<CatalogClient> {
        &self.catalog
    }

    /// The player facade, present when a streaming backend was configured.
    pub fn player(&self) -> Option<&Arc<PlayerFacade>> {
        self.player.as_ref()
    }
}

impl std::fmt::Debug for SpotifyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyService")
            .field("has_player", &self.player.is_some())
            .finish()
    }
}
