//! Catalog data model
//!
//! Public result types handed to hosts, plus the private wire shapes the
//! Spotify Web API returns. Wire types keep the API's field names; public
//! types are flattened for display.

use serde::{Deserialize, Serialize};

/// A track row from a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    /// Spotify URI, e.g. `spotify:track:4iV5W9uYEdYUVa79Axb7Rh`
    pub uri: String,
    pub name: String,
    pub album: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    /// Largest album artwork image, when the API returned one
    pub artwork_url: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Zero-based page index this result covers
    pub page: u32,
    pub has_next_page: bool,
    pub total_results: u32,
    pub tracks: Vec<Track>,
}

/// A playlist row from a playlist listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub owner: Option<String>,
    pub total_tracks: u32,
    pub artwork_url: Option<String>,
}

/// Whose playlists to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistScope {
    /// The authenticated user's playlists (`/v1/me/playlists`)
    Mine,
    /// Another user's public playlists (`/v1/users/{id}/playlists`)
    User(String),
}

// ---------------------------------------------------------------------------
// Wire shapes (Spotify Web API)
// ---------------------------------------------------------------------------

/// Generic paging envelope the API wraps list results in.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiPaging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub total: u32,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiSearchResponse {
    pub tracks: ApiPaging<ApiTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    pub album: ApiAlbum,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylist {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub owner: Option<ApiPlaylistOwner>,
    pub tracks: ApiPlaylistTracks,
    // The API returns `"images": null` for playlists without artwork
    #[serde(default)]
    pub images: Option<Vec<ApiImage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylistOwner {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylistTracks {
    pub total: u32,
}

impl From<ApiTrack> for Track {
    fn from(track: ApiTrack) -> Self {
        // The API orders images largest-first
        let artwork_url = track.album.images.first().map(|img| img.url.clone());

        Self {
            id: track.id,
            uri: track.uri,
            name: track.name,
            album: track.album.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            duration_ms: track.duration_ms,
            preview_url: track.preview_url,
            artwork_url,
        }
    }
}

impl From<ApiPlaylist> for PlaylistSummary {
    fn from(playlist: ApiPlaylist) -> Self {
        let artwork_url = playlist
            .images
            .unwrap_or_default()
            .first()
            .map(|img| img.url.clone());

        Self {
            id: playlist.id,
            uri: playlist.uri,
            name: playlist.name,
            owner: playlist.owner.and_then(|o| o.display_name),
            total_tracks: playlist.tracks.total,
            artwork_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_maps_album_and_artists() {
        let json = r#"{
            "id": "4iV5W9uYEdYUVa79Axb7Rh",
            "uri": "spotify:track:4iV5W9uYEdYUVa79Axb7Rh",
            "name": "Paranoid Android",
            "duration_ms": 383066,
            "preview_url": "https://p.scdn.co/mp3-preview/abc",
            "album": {
                "name": "OK Computer",
                "images": [
                    { "url": "https://i.scdn.co/image/large" },
                    { "url": "https://i.scdn.co/image/small" }
                ]
            },
            "artists": [ { "name": "Radiohead" } ]
        }"#;

        let api: ApiTrack = serde_json::from_str(json).unwrap();
        let track = Track::from(api);

        assert_eq!(track.name, "Paranoid Android");
        assert_eq!(track.album, "OK Computer");
        assert_eq!(track.artists, vec!["Radiohead"]);
        assert_eq!(
            track.artwork_url.as_deref(),
            Some("https://i.scdn.co/image/large")
        );
    }

    #[test]
    fn test_track_without_artwork_or_preview() {
        let json = r#"{
            "id": "id",
            "uri": "spotify:track:id",
            "name": "Obscure",
            "duration_ms": 1000,
            "preview_url": null,
            "album": { "name": "Bootleg" },
            "artists": []
        }"#;

        let api: ApiTrack = serde_json::from_str(json).unwrap();
        let track = Track::from(api);

        assert!(track.preview_url.is_none());
        assert!(track.artwork_url.is_none());
        assert!(track.artists.is_empty());
    }

    #[test]
    fn test_playlist_with_null_images() {
        let json = r#"{
            "id": "pl1",
            "uri": "spotify:playlist:pl1",
            "name": "Road Trip",
            "owner": { "display_name": "JM Wizzler" },
            "tracks": { "total": 42 },
            "images": null
        }"#;

        let api: ApiPlaylist = serde_json::from_str(json).unwrap();
        let playlist = PlaylistSummary::from(api);

        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.owner.as_deref(), Some("JM Wizzler"));
        assert_eq!(playlist.total_tracks, 42);
        assert!(playlist.artwork_url.is_none());
    }
}
