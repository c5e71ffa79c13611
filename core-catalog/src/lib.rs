//! # Core Catalog Module
//!
//! Read access to the Spotify catalog for authenticated sessions: track
//! search, playlist listings, and raw item fetches. All requests borrow the
//! bearer token from the session coordinator at call time.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogClient, SEARCH_PAGE_SIZE};
pub use error::{CatalogError, Result};
pub use types::{PlaylistScope, PlaylistSummary, SearchPage, Track};
