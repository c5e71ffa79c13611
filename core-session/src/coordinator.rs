//! # Session Coordinator
//!
//! Orchestrates the session lifecycle: interactive login, callback exchange,
//! verification and renewal of stored sessions, persistence, and logout.
//!
//! ## Overview
//!
//! The `SessionCoordinator` is an injected instance owned by the composing
//! service; there is no global singleton. Every session-mutating operation is
//! serialized through one internal lock, so a renewal can never race a
//! logout and the stored blob always matches the in-memory session.
//!
//! State changes surface as [`AuthEvent`]s on the shared event bus. A
//! successful save is the single place `LoginSuccess` fires, regardless of
//! which flow produced the session.
//!
//! ## Usage
//!
//! ```ignore
//! use core_session::SessionCoordinator;
//!
//! let coordinator = SessionCoordinator::new(
//!     settings_store,
//!     auth_gateway,
//!     http_client,
//!     event_bus.clone(),
//!     "client-id",
//!     "myapp://callback",
//!     scopes,
//! );
//!
//! // On startup: adopt the stored session, renewing it when stale.
//! if coordinator.verify_session(None).await.is_err() {
//!     coordinator.login().await?;
//!     // ... later, when the OS delivers the redirect:
//!     coordinator.handle_auth_callback(&url).await?;
//! }
//! ```

use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use crate::types::{AuthState, Session, UserProfile};
use bridge_traits::{AuthGateway, HttpClient, HttpMethod, HttpRequest, LoginRequest, SettingsStore};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Base URL for the Spotify Web API.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Mutable coordinator state, guarded by a single lock.
struct CoordinatorState {
    auth_state: AuthState,
    current: Option<Session>,
}

/// Coordinates authentication state and session persistence.
///
/// All session-mutating operations (`handle_auth_callback`, `verify_session`,
/// `renew_session`, `save_session`, `logout`) serialize through one internal
/// mutex. Read accessors take the same lock briefly and clone out.
pub struct SessionCoordinator {
    store: SessionStore,
    gateway: Arc<dyn AuthGateway>,
    http: Arc<dyn HttpClient>,
    event_bus: EventBus,
    client_id: String,
    redirect_uri: String,
    scopes: Vec<String>,
    state: Mutex<CoordinatorState>,
}

impl SessionCoordinator {
    /// Creates a new session coordinator.
    ///
    /// # Arguments
    ///
    /// * `settings` - Platform settings bridge for session persistence
    /// * `gateway` - Platform auth gateway for the interactive flow
    /// * `http` - HTTP client for Web API calls
    /// * `event_bus` - Event bus for auth state notifications
    /// * `client_id` - OAuth client ID
    /// * `redirect_uri` - Redirect URI callbacks are matched against
    /// * `scopes` - OAuth scopes requested during login
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        gateway: Arc<dyn AuthGateway>,
        http: Arc<dyn HttpClient>,
        event_bus: EventBus,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            store: SessionStore::new(settings),
            gateway,
            http,
            event_bus,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            state: Mutex::new(CoordinatorState {
                auth_state: AuthState::LoggedOut,
                current: None,
            }),
        }
    }

    /// Starts the interactive login flow.
    ///
    /// Emits `LoginCheck` and hands off to the platform gateway. Completion
    /// arrives later through [`handle_auth_callback`](Self::handle_auth_callback)
    /// when the OS delivers the redirect URL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthFlow`] if the client ID or redirect URI
    /// is empty, or if the gateway cannot open the login surface; the latter
    /// emits a `LoginError` event alongside.
    #[instrument(skip(self))]
    pub async fn login(&self) -> Result<()> {
        if self.client_id.is_empty() || self.redirect_uri.is_empty() {
            return Err(SessionError::AuthFlow(
                "Client ID and redirect URI must be configured before login".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        state.auth_state = AuthState::Verifying;
        self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoginCheck));

        info!("Launching interactive login");
        let request = LoginRequest::new(&self.client_id, &self.redirect_uri, self.scopes.clone());

        if let Err(e) = self.gateway.launch_login(&request).await {
            error!("Failed to launch login surface: {}", e);
            // A failed launch must not disturb whatever session was current
            state.auth_state = if state.current.is_some() {
                AuthState::LoggedIn
            } else {
                AuthState::LoggedOut
            };
            self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoginError {
                message: format!("Failed to launch login: {}", e),
            }));
            return Err(SessionError::AuthFlow(e.to_string()));
        }

        Ok(())
    }

    /// Handles a URL delivered to the host application.
    ///
    /// Returns `Ok(false)` without side effects when the URL is not under
    /// the configured redirect URI; the host can route every incoming URL
    /// here unconditionally. A matching URL is exchanged for a session,
    /// which is persisted and adopted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthFlow`] when the exchange fails (denied
    /// consent, state mismatch, network failure). A `LoginError` event is
    /// emitted alongside; any previously current session stays current.
    #[instrument(skip(self, url))]
    pub async fn handle_auth_callback(&self, url: &str) -> Result<bool> {
        if !url.starts_with(&self.redirect_uri) {
            debug!("URL is not an auth callback, ignoring");
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        info!("Auth callback received, exchanging for tokens");

        let grant = match self.gateway.exchange_callback(url).await {
            Ok(grant) => grant,
            Err(e) => {
                error!("Callback exchange failed: {}", e);
                // A failed exchange must not disturb whatever session was current
                state.auth_state = if state.current.is_some() {
                    AuthState::LoggedIn
                } else {
                    AuthState::LoggedOut
                };
                self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoginError {
                    message: format!("Login failed: {}", e),
                }));
                return Err(SessionError::AuthFlow(e.to_string()));
            }
        };

        let session = Session::from_grant(grant, None);
        self.adopt_session(&mut state, session).await?;
        Ok(true)
    }

    /// Verifies a session and adopts it, renewing when stale.
    ///
    /// With `session` set, that session is verified; otherwise the stored
    /// one is loaded. A session past (or near) expiry is renewed through the
    /// gateway. Renewal failure here logs the user out before the error is
    /// returned: a session that can neither be used nor renewed is dead
    /// weight, and keeping it would only defer the same failure to the first
    /// API call.
    ///
    /// Returns the session that is now current.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] - no session was passed and none
    ///   is stored
    /// - [`SessionError::TokenRenewalFailed`] - the session is stale and
    ///   could not be renewed; the logout side effect has already run
    #[instrument(skip(self, session))]
    pub async fn verify_session(&self, session: Option<Session>) -> Result<Session> {
        let mut state = self.state.lock().await;
        state.auth_state = AuthState::Verifying;
        self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoginCheck));

        let candidate = match session {
            Some(session) => Some(session),
            None => self.store.load().await?,
        };

        let Some(candidate) = candidate else {
            debug!("No session to verify");
            state.auth_state = AuthState::LoggedOut;
            state.current = None;
            return Err(SessionError::NotAuthenticated);
        };

        if !candidate.is_expired() {
            debug!("Session is valid");
            state.current = Some(candidate.clone());
            state.auth_state = AuthState::LoggedIn;
            self.event_bus
                .emit(CoreEvent::Auth(AuthEvent::LoginChange { logged_in: true }));
            return Ok(candidate);
        }

        let Some(refresh_token) = candidate.refresh_token.clone() else {
            warn!("Session expired with no refresh token, logging out");
            self.clear_session(&mut state).await?;
            return Err(SessionError::TokenRenewalFailed(
                "Session expired and carries no refresh token".to_string(),
            ));
        };

        info!("Session expired, renewing");
        state.auth_state = AuthState::Renewing;

        match self.gateway.renew(&refresh_token).await {
            Ok(grant) => {
                let renewed = Session::from_grant(grant, Some(refresh_token));
                self.adopt_session(&mut state, renewed.clone()).await?;
                Ok(renewed)
            }
            Err(e) => {
                warn!("Session renewal failed, logging out: {}", e);
                self.clear_session(&mut state).await?;
                Err(SessionError::TokenRenewalFailed(e.to_string()))
            }
        }
    }

    /// Renews `session` through the gateway; exactly one attempt.
    ///
    /// On success the refreshed session is persisted and adopted as current.
    /// Unlike renewal inside [`verify_session`](Self::verify_session), a
    /// failure here has no logout side effect; whatever was current stays
    /// current and the caller decides what to do with the error.
    ///
    /// # Errors
    ///
    /// [`SessionError::TokenRenewalFailed`] - the session carries no refresh
    /// token, or the gateway exchange failed
    #[instrument(skip(self, session))]
    pub async fn renew_session(&self, session: Session) -> Result<Session> {
        let mut state = self.state.lock().await;

        let refresh_token = session.refresh_token.clone().ok_or_else(|| {
            SessionError::TokenRenewalFailed("Session carries no refresh token".to_string())
        })?;

        let previous_state = state.auth_state;
        state.auth_state = AuthState::Renewing;
        info!("Renewing session");

        match self.gateway.renew(&refresh_token).await {
            Ok(grant) => {
                let renewed = Session::from_grant(grant, Some(refresh_token));
                self.adopt_session(&mut state, renewed.clone()).await?;
                Ok(renewed)
            }
            Err(e) => {
                warn!("Renewal failed, keeping current state: {}", e);
                state.auth_state = previous_state;
                Err(SessionError::TokenRenewalFailed(e.to_string()))
            }
        }
    }

    /// Persists a session and adopts it as current.
    ///
    /// Emits `LoginSuccess` followed by `LoginChange { logged_in: true }`.
    #[instrument(skip(self, session))]
    pub async fn save_session(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock().await;
        self.adopt_session(&mut state, session).await
    }

    /// Logs out: clears the stored session and the in-memory one.
    ///
    /// Emits `LoginChange { logged_in: false }`. Idempotent.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        info!("Logging out");
        self.clear_session(&mut state).await
    }

    /// Fetches the authenticated user's profile from the Web API.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] - no session, or the API
    ///   rejected the token (401)
    /// - [`SessionError::Api`] - other non-success API response
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile> {
        let access_token = self.access_token().await?;

        let request = HttpRequest::new(HttpMethod::Get, format!("{}/me", SPOTIFY_API_BASE))
            .bearer_token(access_token);

        let response = self.http.execute(request).await?;

        if response.status == 401 {
            warn!("API rejected the access token");
            return Err(SessionError::NotAuthenticated);
        }

        if !response.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(SessionError::Api {
                status: response.status,
                message,
            });
        }

        let profile: UserProfile = serde_json::from_slice(&response.body)?;
        debug!(user_id = %profile.id, "Fetched user profile");
        Ok(profile)
    }

    /// Checks that the authenticated account's tier permits streaming.
    ///
    /// Gates playback at the earliest point instead of failing deep inside
    /// the streaming backend. A free or unknown tier emits `PremiumRequired`,
    /// forces a logout, and returns [`SessionError::PremiumRequired`] so
    /// hosts can tell the business rejection from a transport failure.
    #[instrument(skip(self))]
    pub async fn check_premium(&self) -> Result<UserProfile> {
        let profile = self.current_user().await?;

        if profile.is_premium() {
            return Ok(profile);
        }

        info!("Account is not premium, logging out");
        let message = "A Spotify Premium subscription is required for playback".to_string();
        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::PremiumRequired {
                message: message.clone(),
            }));

        let mut state = self.state.lock().await;
        self.clear_session(&mut state).await?;

        Err(SessionError::PremiumRequired(message))
    }

    /// The current session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.state.lock().await.current.clone()
    }

    /// The current authentication state.
    pub async fn auth_state(&self) -> AuthState {
        self.state.lock().await.auth_state
    }

    /// The current access token, for API surfaces that attach bearer auth.
    pub async fn access_token(&self) -> Result<String> {
        let state = self.state.lock().await;
        state
            .current
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Persists `session`, makes it current, and announces the login.
    ///
    /// Single emission point for `LoginSuccess`.
    async fn adopt_session(&self, state: &mut CoordinatorState, session: Session) -> Result<()> {
        self.store.save(&session).await?;
        state.current = Some(session);
        state.auth_state = AuthState::LoggedIn;

        self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoginSuccess));
        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::LoginChange { logged_in: true }));

        info!("Session saved and adopted");
        Ok(())
    }

    async fn clear_session(&self, state: &mut CoordinatorState) -> Result<()> {
        self.store.clear().await?;
        state.current = None;
        state.auth_state = AuthState::LoggedOut;

        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::LoginChange { logged_in: false }));
        Ok(())
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
