use core_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Malformed API response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(SessionError),
}

impl From<SessionError> for CatalogError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAuthenticated => CatalogError::NotAuthenticated,
            other => CatalogError::Session(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_maps_to_not_authenticated() {
        let err: CatalogError = SessionError::NotAuthenticated.into();
        assert!(matches!(err, CatalogError::NotAuthenticated));
    }

    #[test]
    fn test_other_session_errors_are_wrapped() {
        let err: CatalogError = SessionError::AuthFlow("denied".to_string()).into();
        assert!(matches!(err, CatalogError::Session(_)));
    }
}
