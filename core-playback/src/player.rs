//! Player Facade
//!
//! High-level playback surface over the platform's native streaming
//! controller. The facade never touches audio; it gates playback on the
//! session, drives the [`StreamingBackend`] with load/pause/resume commands,
//! and turns controller state changes into [`PlayerEvent`]s on the shared
//! bus.
//!
//! A background listener watches the bus for `LoginChange { logged_in:
//! false }` and tears playback down, so a logout anywhere in the app stops
//! the music without the host wiring anything extra.

use crate::error::{PlaybackError, Result};
use bridge_traits::StreamingBackend;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, PlayerEvent};
use core_session::SessionCoordinator;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Playback state shared with the teardown listener.
#[derive(Debug, Default)]
struct PlayerState {
    active: bool,
    playing: bool,
    current_track: Option<String>,
}

impl PlayerState {
    fn reset(&mut self) {
        self.active = false;
        self.playing = false;
        self.current_track = None;
    }
}

/// Facade over the native streaming controller.
///
/// # Example
///
/// ```ignore
/// use core_playback::PlayerFacade;
///
/// let player = PlayerFacade::new(coordinator, backend, event_bus);
/// player.activate().await?;
/// player.toggle_play(Some("spotify:track:4iV5W9uYEdYUVa79Axb7Rh")).await?;
/// assert!(player.is_playing());
/// ```
pub struct PlayerFacade {
    coordinator: Arc<SessionCoordinator>,
    backend: Arc<dyn StreamingBackend>,
    event_bus: EventBus,
    state: Arc<Mutex<PlayerState>>,
    teardown_task: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerFacade {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        backend: Arc<dyn StreamingBackend>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            coordinator,
            backend,
            event_bus,
            state: Arc::new(Mutex::new(PlayerState::default())),
            teardown_task: Mutex::new(None),
        }
    }

    /// Brings the player up for the current session.
    ///
    /// Verifies the streaming entitlement, binds the backend to the access
    /// token, emits `PlayerReady`, and installs the logout teardown
    /// listener. Safe to call again after a logout.
    ///
    /// # Errors
    ///
    /// - [`SessionError::PremiumRequired`](core_session::SessionError::PremiumRequired) -
    ///   the account tier does not permit streaming (the coordinator has
    ///   already logged the user out)
    /// - [`SessionError::NotAuthenticated`](core_session::SessionError::NotAuthenticated) -
    ///   no current session
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<()> {
        // Entitlement gate, at the earliest point
        self.coordinator.check_premium().await?;

        let access_token = self.coordinator.access_token().await?;
        self.backend.initialize(&access_token).await?;

        lock(&self.state).active = true;
        info!("Player activated");
        self.event_bus
            .emit(CoreEvent::Player(PlayerEvent::PlayerReady));

        self.install_teardown_listener();
        Ok(())
    }

    /// Loads a track or toggles pause/resume.
    ///
    /// With a `track_uri` different from the current track, loads it and
    /// starts playback, emitting `TrackChange`, `AlbumArtChange` (from the
    /// controller's metadata), and `PlaybackChange`. With `None` or the
    /// already-current URI, toggles pause/resume and emits `PlaybackChange`.
    #[instrument(skip(self))]
    pub async fn toggle_play(&self, track_uri: Option<&str>) -> Result<()> {
        {
            let state = lock(&self.state);
            if !state.active {
                return Err(PlaybackError::NotActive);
            }
        }
        // A stale token fails here rather than deep inside the controller
        self.coordinator.access_token().await?;

        let current = lock(&self.state).current_track.clone();
        let is_new_track = match track_uri {
            Some(uri) => current.as_deref() != Some(uri),
            None => false,
        };

        if is_new_track {
            let uri = track_uri.unwrap_or_default().to_string();
            debug!(track = %uri, "Loading track");
            self.backend.load_track(&uri).await?;

            {
                let mut state = lock(&self.state);
                state.current_track = Some(uri.clone());
                state.playing = true;
            }

            self.event_bus
                .emit(CoreEvent::Player(PlayerEvent::TrackChange {
                    track_uri: uri,
                }));
            self.emit_album_art().await;
            self.event_bus
                .emit(CoreEvent::Player(PlayerEvent::PlaybackChange {
                    playing: true,
                }));
            return Ok(());
        }

        if current.is_none() {
            debug!("Toggle with no track loaded, ignoring");
            return Ok(());
        }

        let playing = lock(&self.state).playing;
        if playing {
            self.backend.pause().await?;
        } else {
            self.backend.resume().await?;
        }

        let now_playing = !playing;
        lock(&self.state).playing = now_playing;
        self.event_bus
            .emit(CoreEvent::Player(PlayerEvent::PlaybackChange {
                playing: now_playing,
            }));
        Ok(())
    }

    /// Whether a track is currently playing.
    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    /// URI of the currently loaded track, if any.
    pub fn current_track(&self) -> Option<String> {
        lock(&self.state).current_track.clone()
    }

    /// Whether `activate()` has run and the player has not been torn down.
    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    /// Emits `AlbumArtChange` from the controller's current metadata.
    async fn emit_album_art(&self) {
        match self.backend.current_metadata().await {
            Ok(metadata) => {
                let url = metadata.and_then(|m| m.album_art_url);
                self.event_bus
                    .emit(CoreEvent::Player(PlayerEvent::AlbumArtChange { url }));
            }
            Err(e) => {
                // Artwork is cosmetic; playback continues without it
                warn!("Failed to read track metadata: {}", e);
            }
        }
    }

    /// Spawns the bus listener that tears playback down on logout.
    ///
    /// Replaces any listener from an earlier activation.
    fn install_teardown_listener(&self) {
        let mut receiver = self.event_bus.subscribe();
        let backend = self.backend.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(CoreEvent::Auth(AuthEvent::LoginChange { logged_in: false })) => {
                        info!("Logout observed, tearing playback down");
                        if let Err(e) = backend.shutdown().await {
                            warn!("Backend shutdown failed: {}", e);
                        }
                        lock(&state).reset();
                        break;
                    }
                    Ok(_) => {}
                    // Lagged receivers keep listening; a closed bus ends the task
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut slot = lock_task(&self.teardown_task);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for PlayerFacade {
    fn drop(&mut self) {
        if let Some(task) = lock_task(&self.teardown_task).take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for PlayerFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("PlayerFacade")
            .field("active", &state.active)
            .field("playing", &state.playing)
            .field("current_track", &state.current_track)
            .finish()
    }
}

// Poisoned locks carry no invariant worth dying for here
fn lock(state: &Mutex<PlayerState>) -> std::sync::MutexGuard<'_, PlayerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn lock_task(
    slot: &Mutex<Option<JoinHandle<()>>>,
) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::{
        AuthGateway, HttpClient, HttpRequest, HttpResponse, LoginRequest, SettingsStore,
        TokenGrant, TrackMetadata,
    };
    use bytes::Bytes;
    use chrono::{Duration, Utc};
    use core_session::Session;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex as TokioMutex;

    struct MemorySettings {
        storage: TokioMutex<HashMap<String, String>>,
    }

    impl MemorySettings {
        fn new() -> Self {
            Self {
                storage: TokioMutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.storage
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.storage.lock().await.get(key).cloned())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.storage.lock().await.remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.storage.lock().await.keys().cloned().collect())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            self.storage.lock().await.clear();
            Ok(())
        }
    }

    struct NoopGateway;

    #[async_trait]
    impl AuthGateway for NoopGateway {
        async fn launch_login(&self, _request: &LoginRequest) -> BridgeResult<()> {
            Ok(())
        }

        async fn exchange_callback(&self, _url: &str) -> BridgeResult<TokenGrant> {
            Err(BridgeError::NotAvailable("not under test".to_string()))
        }

        async fn renew(&self, _refresh_token: &str) -> BridgeResult<TokenGrant> {
            Err(BridgeError::NotAvailable("not under test".to_string()))
        }
    }

    /// HTTP stub serving the same profile body for every request.
    struct ProfileHttp {
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for ProfileHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(self.body),
            })
        }
    }

    /// Recording streaming backend.
    struct StubBackend {
        initialized: AtomicBool,
        shutdown_calls: AtomicUsize,
        pause_calls: AtomicUsize,
        resume_calls: AtomicUsize,
        loaded: TokioMutex<Option<String>>,
        metadata: Option<TrackMetadata>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                initialized: AtomicBool::new(false),
                shutdown_calls: AtomicUsize::new(0),
                pause_calls: AtomicUsize::new(0),
                resume_calls: AtomicUsize::new(0),
                loaded: TokioMutex::new(None),
                metadata: None,
            }
        }

        fn with_metadata(mut self, metadata: TrackMetadata) -> Self {
            self.metadata = Some(metadata);
            self
        }
    }

    #[async_trait]
    impl StreamingBackend for StubBackend {
        async fn initialize(&self, _access_token: &str) -> BridgeResult<()> {
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn load_track(&self, track_uri: &str) -> BridgeResult<()> {
            *self.loaded.lock().await = Some(track_uri.to_string());
            Ok(())
        }

        async fn resume(&self) -> BridgeResult<()> {
            self.resume_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn pause(&self) -> BridgeResult<()> {
            self.pause_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn current_metadata(&self) -> BridgeResult<Option<TrackMetadata>> {
            Ok(self.metadata.clone())
        }

        async fn shutdown(&self) -> BridgeResult<()> {
            self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const PREMIUM_PROFILE: &str = r#"{
        "id": "wizzler",
        "display_name": "JM Wizzler",
        "product": "premium"
    }"#;

    const FREE_PROFILE: &str = r#"{
        "id": "freeloader",
        "product": "free"
    }"#;

    struct Harness {
        player: PlayerFacade,
        backend: Arc<StubBackend>,
        coordinator: Arc<SessionCoordinator>,
        event_bus: EventBus,
    }

    async fn harness(backend: StubBackend, profile_body: &'static str) -> Harness {
        let event_bus = EventBus::new(100);
        let coordinator = Arc::new(SessionCoordinator::new(
            Arc::new(MemorySettings::new()),
            Arc::new(NoopGateway),
            Arc::new(ProfileHttp { body: profile_body }),
            event_bus.clone(),
            "test-client",
            "myapp://callback",
            vec!["streaming".to_string()],
        ));

        coordinator
            .save_session(Session {
                access_token: "player-token".to_string(),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::hours(1)),
            })
            .await
            .unwrap();

        let backend = Arc::new(backend);
        let player = PlayerFacade::new(coordinator.clone(), backend.clone(), event_bus.clone());

        Harness {
            player,
            backend,
            coordinator,
            event_bus,
        }
    }

    fn drain_events(
        receiver: &mut core_runtime::events::Receiver<CoreEvent>,
    ) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_activate_initializes_backend_and_emits_ready() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;
        let mut rx = h.event_bus.subscribe();

        h.player.activate().await.unwrap();

        assert!(h.backend.initialized.load(Ordering::SeqCst));
        assert!(h.player.is_active());

        let events = drain_events(&mut rx);
        assert!(events.contains(&CoreEvent::Player(PlayerEvent::PlayerReady)));
    }

    #[tokio::test]
    async fn test_activate_rejects_free_account() {
        let h = harness(StubBackend::new(), FREE_PROFILE).await;

        let result = h.player.activate().await;

        assert!(matches!(
            result,
            Err(PlaybackError::Session(
                core_session::SessionError::PremiumRequired(_)
            ))
        ));
        assert!(!h.backend.initialized.load(Ordering::SeqCst));
        assert!(!h.player.is_active());
    }

    #[tokio::test]
    async fn test_toggle_play_before_activate_fails() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;

        let result = h.player.toggle_play(Some("spotify:track:t1")).await;
        assert!(matches!(result, Err(PlaybackError::NotActive)));
    }

    #[tokio::test]
    async fn test_new_track_loads_and_emits_events() {
        let metadata = TrackMetadata {
            track_uri: Some("spotify:track:t1".to_string()),
            album_art_url: Some("https://i.scdn.co/image/art".to_string()),
            ..TrackMetadata::default()
        };
        let h = harness(StubBackend::new().with_metadata(metadata), PREMIUM_PROFILE).await;
        h.player.activate().await.unwrap();
        let mut rx = h.event_bus.subscribe();

        h.player.toggle_play(Some("spotify:track:t1")).await.unwrap();

        assert!(h.player.is_playing());
        assert_eq!(
            h.player.current_track().as_deref(),
            Some("spotify:track:t1")
        );
        assert_eq!(
            h.backend.loaded.lock().await.as_deref(),
            Some("spotify:track:t1")
        );

        let events = drain_events(&mut rx);
        assert_eq!(
            events,
            vec![
                CoreEvent::Player(PlayerEvent::TrackChange {
                    track_uri: "spotify:track:t1".to_string(),
                }),
                CoreEvent::Player(PlayerEvent::AlbumArtChange {
                    url: Some("https://i.scdn.co/image/art".to_string()),
                }),
                CoreEvent::Player(PlayerEvent::PlaybackChange { playing: true }),
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_same_track_pauses_then_resumes() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;
        h.player.activate().await.unwrap();
        h.player.toggle_play(Some("spotify:track:t1")).await.unwrap();
        let mut rx = h.event_bus.subscribe();

        // Same URI: pause
        h.player.toggle_play(Some("spotify:track:t1")).await.unwrap();
        assert!(!h.player.is_playing());
        assert_eq!(h.backend.pause_calls.load(Ordering::SeqCst), 1);

        // None: resume
        h.player.toggle_play(None).await.unwrap();
        assert!(h.player.is_playing());
        assert_eq!(h.backend.resume_calls.load(Ordering::SeqCst), 1);

        let events = drain_events(&mut rx);
        assert_eq!(
            events,
            vec![
                CoreEvent::Player(PlayerEvent::PlaybackChange { playing: false }),
                CoreEvent::Player(PlayerEvent::PlaybackChange { playing: true }),
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_without_loaded_track_is_noop() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;
        h.player.activate().await.unwrap();

        h.player.toggle_play(None).await.unwrap();

        assert!(!h.player.is_playing());
        assert_eq!(h.backend.pause_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.backend.resume_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logout_tears_playback_down() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;
        h.player.activate().await.unwrap();
        h.player.toggle_play(Some("spotify:track:t1")).await.unwrap();

        h.coordinator.logout().await.unwrap();

        // The teardown listener runs on a spawned task
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(h.backend.shutdown_calls.load(Ordering::SeqCst), 1);
        assert!(!h.player.is_active());
        assert!(!h.player.is_playing());
        assert!(h.player.current_track().is_none());
    }

    #[tokio::test]
    async fn test_reactivation_after_logout() {
        let h = harness(StubBackend::new(), PREMIUM_PROFILE).await;
        h.player.activate().await.unwrap();

        h.coordinator.logout().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!h.player.is_active());

        // Log back in and come up again
        h.coordinator
            .save_session(Session {
                access_token: "player-token-2".to_string(),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::hours(1)),
            })
            .await
            .unwrap();

        h.player.activate().await.unwrap();
        assert!(h.player.is_active());
    }
}
