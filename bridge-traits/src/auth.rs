//! Authentication Gateway Abstraction
//!
//! The seam between the portable session core and the platform's interactive
//! OAuth surface. Desktop hosts drive a system browser; mobile hosts hand the
//! flow to the vendor SDK's login activity/controller. Either way the core
//! only sees three operations: launch, exchange, renew.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parameters for starting an interactive login flow.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// OAuth client ID
    pub client_id: String,
    /// Redirect URI the platform delivers the callback to
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl LoginRequest {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }
}

/// Token set returned by a successful code exchange or renewal.
///
/// `expires_in` is the provider-reported lifetime in seconds; callers convert
/// it to an absolute expiry. `Debug` redacts token values so a grant can be
/// logged without leaking credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in,
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Platform authentication gateway
///
/// One interface, platform-specific adapters behind it, selected at
/// composition time. Implementations own whatever transient state the flow
/// needs between `launch_login` and `exchange_callback` (PKCE verifier,
/// CSRF state).
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Open the platform's interactive login surface.
    ///
    /// Fire-and-forget: completion is observed when the OS delivers the
    /// redirect URL back to the host, not through this call's return value.
    async fn launch_login(&self, request: &LoginRequest) -> Result<()>;

    /// Exchange a delivered redirect URL for a token grant.
    ///
    /// The URL is guaranteed by the caller to be under the configured
    /// redirect URI. Implementations must reject callbacks carrying an
    /// `error` parameter or a state mismatch.
    async fn exchange_callback(&self, url: &str) -> Result<TokenGrant>;

    /// Exchange a refresh token for a fresh grant.
    ///
    /// Exactly one attempt; retry policy belongs to the caller.
    async fn renew(&self, refresh_token: &str) -> Result<TokenGrant>;
}
