//! # Core Session Module
//!
//! Session lifecycle for the Spotify core: interactive login, persisted
//! sessions, verification and renewal, user profile and entitlement checks.
//!
//! ## Overview
//!
//! The central type is [`SessionCoordinator`], an injected instance that owns
//! all session state and serializes mutations internally. Persistence goes
//! through [`SessionStore`] over the platform settings bridge; the
//! interactive flow goes through the platform's
//! [`AuthGateway`](bridge_traits::AuthGateway).

pub mod coordinator;
pub mod error;
pub mod store;
pub mod types;

pub use coordinator::{SessionCoordinator, SPOTIFY_API_BASE};
pub use error::{Result, SessionError};
pub use store::{SessionStore, SESSION_STORAGE_KEY};
pub use types::{AuthState, Session, UserProfile, EXPIRY_BUFFER_SECONDS};
