use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Login flow failed: {0}")]
    AuthFlow(String),

    #[error("Token renewal failed: {0}")]
    TokenRenewalFailed(String),

    /// Account tier does not permit streaming. A business rejection, kept
    /// apart from transport failures so hosts can show the right message.
    #[error("Spotify Premium required: {0}")]
    PremiumRequired(String),

    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
