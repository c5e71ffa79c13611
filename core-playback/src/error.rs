use core_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// `activate()` has not run (or teardown has since reset the player)
    #[error("Player is not active")]
    NotActive,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Streaming backend error: {0}")]
    Backend(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
