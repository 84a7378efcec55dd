//! Catalog API Data Transfer Objects
//!
//! These types match what the catalog web API returns.
//! DO NOT use these types outside the catalog module - convert to domain types.
//!
//! Fields the adapter relies on (`id`, `name`, `artists`) are required, so a
//! response of an unexpected shape fails to parse instead of producing
//! half-empty items.

use serde::{Deserialize, Serialize};

/// `POST /api/token` response (client-credentials grant)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds (not tracked)
    pub expires_in: Option<u64>,
}

/// Token endpoint error body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenError {
    pub error: String,
    pub error_description: Option<String>,
}

/// `GET /search` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<TrackObject>>,
    pub albums: Option<Paging<AlbumObject>>,
}

/// `GET /browse/new-releases` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewReleasesResponse {
    pub albums: Paging<AlbumObject>,
}

/// One page of results. Continuations (`next`) are never followed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub total: Option<u32>,
    pub next: Option<String>,
}

/// Track object (full from `/tracks/{id}` and search, simplified inside albums)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackObject {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    /// Absent on the simplified tracks embedded in an album
    pub album: Option<AlbumObject>,
    pub duration_ms: Option<u64>,
    pub track_number: Option<u32>,
    pub external_urls: Option<ExternalUrls>,
}

/// Album object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumObject {
    pub id: String,
    pub name: String,
    /// Missing when the album is embedded in a track object of some responses
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub images: Vec<Image>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub release_date: Option<String>,
    pub album_type: Option<String>,
    pub total_tracks: Option<u32>,
    /// First page of tracks, present on `/albums/{id}`
    pub tracks: Option<Paging<TrackObject>>,
}

/// `GET /artists/{id}/related-artists` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelatedArtistsResponse {
    pub artists: Vec<ArtistObject>,
}

/// Full artist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub popularity: Option<u32>,
}

/// Artist reference inside track/album objects
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

/// Image, largest first
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Regular API error body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
