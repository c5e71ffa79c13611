//! # Core Playback Module
//!
//! Session-gated playback control over the platform's native streaming
//! controller. The heavy lifting (buffers, codecs, device routing) lives
//! behind the [`StreamingBackend`](bridge_traits::StreamingBackend) seam;
//! this crate owns the entitlement gate, the play/pause state machine, and
//! the player events hosts subscribe to.

pub mod error;
pub mod player;

pub use error::{PlaybackError, Result};
pub use player::PlayerFacade;
