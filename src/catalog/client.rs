//! Catalog HTTP client
//!
//! Issues authenticated reads against the catalog web API and runs every
//! response through the adapter.
//!
//! ## Failure contract
//!
//! The public operations never return errors. List operations degrade to an
//! empty `Vec`; lookups answer [`Lookup::NotFound`] for a 4xx and the
//! [`CatalogItem::unknown`] sentinel for anything else. Each swallowed
//! failure is logged with `tracing::warn!`. The `try_*` variants expose the
//! underlying [`CatalogError`] for callers that want it.
//!
//! ## Token policy
//!
//! Each request fetches its own token first. If that fails the request is
//! not sent at all: nothing ever goes out without an `Authorization` header.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::domain::{CatalogError, Lookup};
use super::traits::TokenSource;
use super::{adapter, dto};
use crate::config::{CatalogConfig, ConfigError};
use crate::model::{Artist, CatalogItem, ItemKind};

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    page_size: u32,
    timeout: Duration,
    tokens: Arc<dyn TokenSource>,
}

impl CatalogClient {
    /// Create a client from configuration, with a real token provider.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, crate::error::Error> {
        let client_id = config
            .client_id
            .clone()
            .ok_or(ConfigError::MissingCredential("TRACKLIST_CLIENT_ID"))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or(ConfigError::MissingCredential("TRACKLIST_CLIENT_SECRET"))?;

        let tokens = super::TokenProvider::new(
            config.token_url.clone(),
            client_id,
            client_secret,
            config.timeout(),
        )?;

        Ok(Self::new(
            config.api_url.clone(),
            config.page_size,
            config.timeout(),
            Arc::new(tokens),
        )?)
    }

    /// Create a client with an explicit token source.
    pub fn new(
        base_url: impl Into<String>,
        page_size: u32,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size,
            timeout,
            tokens,
        })
    }

    // ========================================================================
    // Infallible operations
    // ========================================================================

    /// Keyword search over tracks and albums.
    ///
    /// Blank queries return nothing without touching the network.
    pub async fn search(&self, query: &str) -> Vec<CatalogItem> {
        match self.try_search(query).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(query, error = %e, "Catalog search failed");
                Vec::new()
            }
        }
    }

    /// Look up a single track by id.
    pub async fn lookup_by_id(&self, id: &str) -> Lookup {
        self.lookup(ItemKind::Track, id).await
    }

    /// Look up a single album by id.
    pub async fn lookup_album(&self, id: &str) -> Lookup {
        self.lookup(ItemKind::Album, id).await
    }

    /// Look up an entity of the given kind.
    pub async fn lookup(&self, kind: ItemKind, id: &str) -> Lookup {
        match self.try_lookup(kind, id).await {
            Ok(item) => Lookup::Found(item),
            Err(e) if e.is_client_error() => {
                tracing::debug!(id, kind = kind.as_str(), error = %e, "Catalog entity not found");
                Lookup::NotFound
            }
            Err(e) => {
                tracing::warn!(id, kind = kind.as_str(), error = %e, "Catalog lookup failed");
                Lookup::Found(CatalogItem::unknown(id, kind))
            }
        }
    }

    /// Tracks on the first page of an album. Continuations are not followed.
    pub async fn get_tracks_for_album(&self, album_id: &str) -> Vec<CatalogItem> {
        match self.try_get_tracks_for_album(album_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(album_id, error = %e, "Album track listing failed");
                Vec::new()
            }
        }
    }

    /// Newly released albums.
    pub async fn new_releases(&self) -> Vec<CatalogItem> {
        match self.try_new_releases().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "New releases request failed");
                Vec::new()
            }
        }
    }

    /// Artists the catalog considers similar to `artist_id`.
    pub async fn related_artists(&self, artist_id: &str) -> Vec<Artist> {
        match self.try_related_artists(artist_id).await {
            Ok(artists) => artists,
            Err(e) => {
                tracing::warn!(artist_id, error = %e, "Related artists request failed");
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Fallible operations
    // ========================================================================

    pub async fn try_search(&self, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/search?q={}&type=track,album&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.page_size
        );
        let response: dto::SearchResponse = self.get_json(&url).await?;
        Ok(adapter::search_to_items(response))
    }

    pub async fn try_lookup(&self, kind: ItemKind, id: &str) -> Result<CatalogItem, CatalogError> {
        let url = format!(
            "{}/{}s/{}",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(id)
        );
        match kind {
            ItemKind::Track => {
                let track: dto::TrackObject = self.get_json(&url).await?;
                Ok(adapter::track_to_item(track))
            }
            ItemKind::Album => {
                let album: dto::AlbumObject = self.get_json(&url).await?;
                Ok(adapter::album_to_item(album))
            }
        }
    }

    pub async fn try_get_tracks_for_album(
        &self,
        album_id: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let url = format!("{}/albums/{}", self.base_url, urlencoding::encode(album_id));
        let album: dto::AlbumObject = self.get_json(&url).await?;
        Ok(adapter::album_tracks_to_items(album))
    }

    pub async fn try_new_releases(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let url = format!(
            "{}/browse/new-releases?limit={}",
            self.base_url, self.page_size
        );
        let response: dto::NewReleasesResponse = self.get_json(&url).await?;
        Ok(adapter::new_releases_to_items(response))
    }

    pub async fn try_related_artists(&self, artist_id: &str) -> Result<Vec<Artist>, CatalogError> {
        let url = format!(
            "{}/artists/{}/related-artists",
            self.base_url,
            urlencoding::encode(artist_id)
        );
        let response: dto::RelatedArtistsResponse = self.get_json(&url).await?;
        Ok(adapter::related_artists_to_artists(response))
    }

    /// Fetch a token, send an authenticated GET and parse the body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let token = self.tokens.get_token().await?;

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .send()
            .await
            .map_err(|e| CatalogError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<dto::ApiErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
            };
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}
