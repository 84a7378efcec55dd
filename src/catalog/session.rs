//! Search-as-you-type session with a stale-response guard.
//!
//! Every call to [`SearchSession::search`] takes the next sequence number.
//! A response only becomes visible if its number is still the latest when
//! it arrives, so a slow response to "a" can never overwrite the results
//! for "ab". With a non-zero debounce, superseded queries are dropped
//! before they reach the catalog at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::traits::CatalogApi;
use crate::model::{CatalogItem, ItemKind};

/// What happened to a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results became visible; carries the result count
    Applied(usize),
    /// A newer search was issued first; nothing changed
    Superseded,
}

/// Client-side kind filter over the visible results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Tracks,
    Albums,
}

impl KindFilter {
    fn accepts(&self, kind: ItemKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Tracks => kind == ItemKind::Track,
            KindFilter::Albums => kind == ItemKind::Album,
        }
    }
}

#[derive(Debug, Default)]
struct Visible {
    seq: u64,
    query: String,
    results: Vec<CatalogItem>,
}

/// Per-screen search state.
pub struct SearchSession<C: CatalogApi + ?Sized> {
    catalog: Arc<C>,
    debounce: Duration,
    latest: AtomicU64,
    visible: Mutex<Visible>,
}

impl<C: CatalogApi + ?Sized> SearchSession<C> {
    pub fn new(catalog: Arc<C>, debounce: Duration) -> Self {
        Self {
            catalog,
            debounce,
            latest: AtomicU64::new(0),
            visible: Mutex::new(Visible::default()),
        }
    }

    /// Run a search for `query` and publish its results if still current.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
            if !self.is_current(seq) {
                tracing::trace!(query, seq, "Search dropped during debounce");
                return SearchOutcome::Superseded;
            }
        }

        let results = self.catalog.search(query).await;
        self.publish(seq, query, results)
    }

    fn is_current(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }

    fn publish(&self, seq: u64, query: &str, results: Vec<CatalogItem>) -> SearchOutcome {
        let mut visible = self.visible.lock();
        if !self.is_current(seq) || seq <= visible.seq {
            tracing::debug!(query, seq, "Discarding stale search response");
            return SearchOutcome::Superseded;
        }

        let count = results.len();
        visible.seq = seq;
        visible.query = query.to_string();
        visible.results = results;
        SearchOutcome::Applied(count)
    }

    /// Query whose results are currently visible.
    pub fn query(&self) -> String {
        self.visible.lock().query.clone()
    }

    /// Currently visible results.
    pub fn results(&self) -> Vec<CatalogItem> {
        self.visible.lock().results.clone()
    }

    /// Visible results narrowed to one kind.
    pub fn filtered(&self, filter: KindFilter) -> Vec<CatalogItem> {
        self.visible
            .lock()
            .results
            .iter()
            .filter(|item| filter.accepts(item.kind))
            .cloned()
            .collect()
    }
}
