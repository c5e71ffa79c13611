use bridge_traits::TokenGrant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buffer applied when judging expiry, so a session that expires mid-request
/// is renewed up front rather than bounced by the API.
pub const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// An authenticated Spotify session.
///
/// Persisted as an opaque JSON blob between launches. A session with no
/// recorded expiry is treated as expired; better one spurious renewal than a
/// stale token presented to the API.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts
/// sensitive information.
///
/// # Examples
///
/// ```
/// use core_session::Session;
/// use chrono::{Duration, Utc};
///
/// let session = Session {
///     access_token: "BQA...".to_string(),
///     refresh_token: Some("AQB...".to_string()),
///     expires_at: Some(Utc::now() + Duration::hours(1)),
/// };
///
/// assert!(!session.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to renew the session, if the provider issued one
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC), if known
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Session {
    /// Builds a session from a token grant, converting the relative
    /// `expires_in` into an absolute expiry.
    ///
    /// A renewal grant that omits the refresh token keeps the previous one;
    /// pass it as `previous_refresh_token`.
    pub fn from_grant(grant: TokenGrant, previous_refresh_token: Option<String>) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or(previous_refresh_token),
            expires_at: grant
                .expires_in
                .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs)),
        }
    }

    /// Check if the access token is expired or expiring imminently.
    ///
    /// Uses the default buffer of [`EXPIRY_BUFFER_SECONDS`].
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(EXPIRY_BUFFER_SECONDS)
    }

    /// Check expiry with a custom buffer.
    ///
    /// A session without a recorded expiry is always reported expired.
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let now = chrono::Utc::now();
                let buffer = chrono::Duration::seconds(buffer_seconds);
                now >= expires_at - buffer
            }
            None => true,
        }
    }

    /// Whether this session carries a refresh token.
    pub fn can_renew(&self) -> bool {
        self.refresh_token.is_some()
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Profile of the authenticated user, as returned by `GET /v1/me`.
///
/// Fields Spotify may omit (closed accounts, restricted markets) are
/// optional; unknown response fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Spotify user ID
    pub id: String,
    /// Display name, when the user has set one
    pub display_name: Option<String>,
    /// Account email (requires the `user-read-email` scope)
    pub email: Option<String>,
    /// Subscription tier ("premium", "free", "open")
    pub product: Option<String>,
    /// Spotify URI for the user
    pub uri: Option<String>,
}

impl UserProfile {
    /// Whether the account tier permits streaming playback.
    ///
    /// Only an explicit `"premium"` product passes; a missing or unknown
    /// tier is treated as non-premium.
    pub fn is_premium(&self) -> bool {
        self.product.as_deref() == Some("premium")
    }
}

/// Authentication state of the session coordinator.
///
/// # State Transitions
///
/// ```text
/// LoggedOut -> Verifying -> LoggedIn
///                             ^  |
///                             |  v
///                           Renewing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    /// No session is current
    #[default]
    LoggedOut,
    /// A login or session verification is in progress
    Verifying,
    /// A session is current and presumed valid
    LoggedIn,
    /// A token renewal is in progress
    Renewing,
}

impl AuthState {
    /// Check if a session is current.
    ///
    /// Returns `true` for `LoggedIn` and `Renewing` states.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::LoggedIn | AuthState::Renewing)
    }

    /// Check if an operation is in progress.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuthState::Verifying | AuthState::Renewing)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::LoggedOut => write!(f, "Logged Out"),
            AuthState::Verifying => write!(f, "Verifying..."),
            AuthState::LoggedIn => write!(f, "Logged In"),
            AuthState::Renewing => write!(f, "Renewing..."),
        }
    }
}
