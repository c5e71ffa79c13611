//! Streaming Backend Abstraction
//!
//! Trait for the platform's native streaming controller. The core never
//! touches audio buffers; it issues high-level commands and reads back
//! whatever metadata the controller reports for the current track.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata reported by the native controller for the loaded track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackMetadata {
    /// Track URI (e.g., `spotify:track:...`)
    pub track_uri: Option<String>,
    /// Display title
    pub name: Option<String>,
    /// Display artist string
    pub artist: Option<String>,
    /// Album or collection name
    pub album: Option<String>,
    /// Album artwork URL, when the controller reports one
    pub album_art_url: Option<String>,
    /// Track duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Trait for platform streaming controllers.
///
/// Implementations wrap the vendor streaming SDK. All methods map onto a
/// single underlying controller instance; the core serializes its calls.
#[async_trait]
pub trait StreamingBackend: Send + Sync {
    /// Bind the controller to an access token. Must be called before any
    /// playback command; may be called again after token renewal.
    async fn initialize(&self, access_token: &str) -> Result<()>;

    /// Load and start playing a track by URI.
    async fn load_track(&self, track_uri: &str) -> Result<()>;

    /// Resume the currently loaded track.
    async fn resume(&self) -> Result<()>;

    /// Pause the currently loaded track.
    async fn pause(&self) -> Result<()>;

    /// Metadata for the currently loaded track, if any.
    async fn current_metadata(&self) -> Result<Option<TrackMetadata>>;

    /// Release the controller and any native resources.
    async fn shutdown(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_metadata_default_is_empty() {
        let metadata = TrackMetadata::default();
        assert!(metadata.track_uri.is_none());
        assert!(metadata.album_art_url.is_none());
    }

    #[test]
    fn track_metadata_roundtrips_through_json() {
        let metadata = TrackMetadata {
            track_uri: Some("spotify:track:123".to_string()),
            name: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            album: None,
            album_art_url: Some("https://i.scdn.co/image/abc".to_string()),
            duration_ms: Some(215_000),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let back: TrackMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
