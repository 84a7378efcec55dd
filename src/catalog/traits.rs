//! Trait definitions for the catalog seams.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses [`TokenProvider`](super::TokenProvider) and
//! [`CatalogClient`](super::CatalogClient); tests substitute the mocks below.

use async_trait::async_trait;

use super::domain::{BearerToken, CatalogError, Lookup};
use crate::model::CatalogItem;

/// Source of bearer tokens for catalog requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self) -> Result<BearerToken, CatalogError>;
}

/// The catalog operations screens are built against.
///
/// None of these fail: list operations degrade to empty and lookups to
/// [`Lookup::NotFound`] or the unknown sentinel.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(&self, query: &str) -> Vec<CatalogItem>;

    async fn lookup_by_id(&self, id: &str) -> Lookup;

    async fn get_tracks_for_album(&self, album_id: &str) -> Vec<CatalogItem>;
}

#[async_trait]
impl TokenSource for super::token::TokenProvider {
    async fn get_token(&self) -> Result<BearerToken, CatalogError> {
        self.get_token().await
    }
}

#[async_trait]
impl CatalogApi for super::client::CatalogClient {
    async fn search(&self, query: &str) -> Vec<CatalogItem> {
        self.search(query).await
    }

    async fn lookup_by_id(&self, id: &str) -> Lookup {
        self.lookup_by_id(id).await
    }

    async fn get_tracks_for_album(&self, album_id: &str) -> Vec<CatalogItem> {
        self.get_tracks_for_album(album_id).await
    }
}

/// Mock implementations for testing.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::model::ItemKind;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    /// Token source that counts how often it was asked.
    pub struct CountingTokens {
        calls: AtomicUsize,
        error: Option<CatalogError>,
    }

    impl CountingTokens {
        pub fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error: None,
            }
        }

        pub fn failing(error: CatalogError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error: Some(error),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingTokens {
        async fn get_token(&self) -> Result<BearerToken, CatalogError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match &self.error {
                Some(err) => Err(err.clone()),
                None => Ok(BearerToken::new(format!("mock-token-{}", n))),
            }
        }
    }

    /// Build a catalog item for fixtures.
    pub fn item(id: &str, title: &str, artist: &str, kind: ItemKind, year: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            primary_artist: artist.to_string(),
            kind,
            year: year.to_string(),
            image_url: String::new(),
        }
    }

    /// Catalog returning canned results per query.
    ///
    /// A query can be gated on a oneshot so tests control the order in
    /// which overlapping searches resolve.
    #[derive(Default)]
    pub struct MockCatalog {
        results: HashMap<String, Vec<CatalogItem>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        searches: Mutex<Vec<String>>,
    }

    impl MockCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_results(mut self, query: &str, items: Vec<CatalogItem>) -> Self {
            self.results.insert(query.to_string(), items);
            self
        }

        /// Hold the response for `query` until the returned sender fires.
        pub fn gate(&self, query: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(query.to_string(), rx);
            tx
        }

        /// Queries that reached the catalog, in call order.
        pub fn searches(&self) -> Vec<String> {
            self.searches.lock().clone()
        }
    }

    #[async_trait]
    impl CatalogApi for MockCatalog {
        async fn search(&self, query: &str) -> Vec<CatalogItem> {
            if query.trim().is_empty() {
                return Vec::new();
            }
            self.searches.lock().push(query.to_string());

            let gate = self.gates.lock().remove(query);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.results.get(query).cloned().unwrap_or_default()
        }

        async fn lookup_by_id(&self, id: &str) -> Lookup {
            self.results
                .values()
                .flatten()
                .find(|item| item.id == id)
                .cloned()
                .map(Lookup::Found)
                .unwrap_or(Lookup::NotFound)
        }

        async fn get_tracks_for_album(&self, _album_id: &str) -> Vec<CatalogItem> {
            Vec::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_counting_tokens() {
            let tokens = CountingTokens::ok();
            let first = tokens.get_token().await.unwrap();
            let second = tokens.get_token().await.unwrap();
            assert_ne!(first, second);
            assert_eq!(tokens.calls(), 2);
        }

        #[tokio::test]
        async fn test_mock_catalog_lookup() {
            let catalog = MockCatalog::new().with_results(
                "queen",
                vec![item("t1", "Bohemian Rhapsody", "Queen", ItemKind::Track, "1975")],
            );
            assert!(matches!(catalog.lookup_by_id("t1").await, Lookup::Found(_)));
            assert_eq!(catalog.lookup_by_id("nope").await, Lookup::NotFound);
        }
    }
}
