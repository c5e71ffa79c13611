//! Spotify Catalog Client
//!
//! Typed wrappers over the Spotify Web API for browsing content: track
//! search, playlist listings, and a raw escape hatch for endpoints without a
//! typed wrapper yet.
//!
//! The client is stateless per call: each request borrows the current bearer
//! token from the session coordinator, so a renewal between two calls is
//! picked up automatically. Transport-level retry lives in the HTTP bridge;
//! this layer maps non-2xx responses straight to errors.

use crate::error::{CatalogError, Result};
use crate::types::{
    ApiPaging, ApiPlaylist, ApiSearchResponse, PlaylistScope, PlaylistSummary, SearchPage, Track,
};
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_session::{SessionCoordinator, SPOTIFY_API_BASE};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Tracks per search page (Spotify's default page size).
pub const SEARCH_PAGE_SIZE: u32 = 20;

/// Playlists requested per listing call.
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Authenticated client for the Spotify catalog.
///
/// # Example
///
/// ```ignore
/// use core_catalog::{CatalogClient, PlaylistScope};
///
/// let catalog = CatalogClient::new(http_client, coordinator.clone());
/// let page = catalog.search("radiohead", 0).await?;
/// let playlists = catalog.playlists(PlaylistScope::Mine).await?;
/// ```
pub struct CatalogClient {
    http_client: Arc<dyn HttpClient>,
    coordinator: Arc<SessionCoordinator>,
}

impl CatalogClient {
    pub fn new(http_client: Arc<dyn HttpClient>, coordinator: Arc<SessionCoordinator>) -> Self {
        Self {
            http_client,
            coordinator,
        }
    }

    /// Searches the catalog for tracks.
    ///
    /// `offset` is the index of the first result, typically a multiple of
    /// [`SEARCH_PAGE_SIZE`]; the returned page reports which page index it
    /// covers and whether more results follow.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, offset: u32) -> Result<SearchPage> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}&offset={}",
            SPOTIFY_API_BASE,
            urlencoding::encode(query),
            SEARCH_PAGE_SIZE,
            offset
        );

        let response = self.get(&url).await?;
        let parsed: ApiSearchResponse = serde_json::from_slice(&response.body)?;

        debug!(
            total = parsed.tracks.total,
            returned = parsed.tracks.items.len(),
            "Search results received"
        );

        Ok(SearchPage {
            page: offset / SEARCH_PAGE_SIZE,
            has_next_page: parsed.tracks.next.is_some(),
            total_results: parsed.tracks.total,
            tracks: parsed.tracks.items.into_iter().map(Track::from).collect(),
        })
    }

    /// Lists playlists for the given scope.
    #[instrument(skip(self))]
    pub async fn playlists(&self, scope: PlaylistScope) -> Result<Vec<PlaylistSummary>> {
        let url = match &scope {
            PlaylistScope::Mine => {
                format!(
                    "{}/me/playlists?limit={}",
                    SPOTIFY_API_BASE, PLAYLIST_PAGE_SIZE
                )
            }
            PlaylistScope::User(user_id) => format!(
                "{}/users/{}/playlists?limit={}",
                SPOTIFY_API_BASE,
                urlencoding::encode(user_id),
                PLAYLIST_PAGE_SIZE
            ),
        };

        let response = self.get(&url).await?;
        let parsed: ApiPaging<ApiPlaylist> = serde_json::from_slice(&response.body)?;

        debug!(count = parsed.items.len(), "Playlists received");

        Ok(parsed
            .items
            .into_iter()
            .map(PlaylistSummary::from)
            .collect())
    }

    /// Raw authenticated GET under the API base.
    ///
    /// For endpoints the typed wrappers don't cover; returns the JSON body
    /// as-is. `path` is relative to the API base, with or without a leading
    /// slash.
    #[instrument(skip(self))]
    pub async fn item(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{}", SPOTIFY_API_BASE, path.trim_start_matches('/'));

        let response = self.get(&url).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Issues an authenticated GET and maps error statuses.
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let access_token = self.coordinator.access_token().await?;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(access_token)
            .header("Accept", "application/json");

        let response = self.http_client.execute(request).await?;

        if response.status == 401 {
            warn!("API rejected the access token");
            return Err(CatalogError::NotAuthenticated);
        }

        if !response.is_success() {
            let message = response.text().unwrap_or_default();
            warn!(status = response.status, "Catalog request failed");
            return Err(CatalogError::Api {
                status: response.status,
                message,
            });
        }

        Ok(response)
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient").finish()
    }
}
