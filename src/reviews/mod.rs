//! Review storage on top of the [`Directory`].
//!
//! Reviews are append-only documents in the `reviews` collection. The
//! author is always taken from the session, and `createdAt` is stamped by
//! the directory, so neither can be forged by the caller.

use std::collections::BTreeSet;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};
use serde_json::{Value, json};

use crate::directory::{Directory, DirectoryError, Document, REVIEWS};
use crate::error::ErrorKind;
use crate::model::{NewReview, Review, ReviewId, ReviewScope, Session};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review text cannot be empty")]
    EmptyText,

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("Review is missing the item it refers to")]
    MissingItem,

    #[error("A review is already being submitted")]
    SubmitInProgress,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::EmptyText
            | ReviewError::RatingOutOfRange(_)
            | ReviewError::MissingItem
            | ReviewError::SubmitInProgress => ErrorKind::Validation,
            ReviewError::Directory(e) => e.kind(),
        }
    }
}

/// Display order for review lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Sort reviews by creation time. Ties keep their stored order.
pub fn sort_reviews(reviews: &mut [Review], order: ReviewSort) {
    match order {
        ReviewSort::NewestFirst => reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ReviewSort::OldestFirst => reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}

/// How far back the liked list reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    #[default]
    All,
    PastWeek,
    PastMonth,
    PastYear,
    /// Calendar dates in UTC, both ends inclusive
    Range { from: NaiveDate, to: NaiveDate },
}

impl DateWindow {
    pub fn label(&self) -> &'static str {
        match self {
            DateWindow::All => "All dates",
            DateWindow::PastWeek => "Past week",
            DateWindow::PastMonth => "Past month",
            DateWindow::PastYear => "Past year",
            DateWindow::Range { .. } => "Date range",
        }
    }

    /// Whether `at` falls inside the window as seen at `now`.
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let since = match self {
            DateWindow::All => return true,
            DateWindow::Range { from, to } => {
                let day = at.date_naive();
                return *from <= day && day <= *to;
            }
            DateWindow::PastWeek => now.checked_sub_signed(TimeDelta::days(7)),
            DateWindow::PastMonth => now.checked_sub_months(Months::new(1)),
            DateWindow::PastYear => now.checked_sub_months(Months::new(12)),
        };
        since.is_none_or(|since| at >= since)
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(DateWindow::All),
            "week" => Ok(DateWindow::PastWeek),
            "month" => Ok(DateWindow::PastMonth),
            "year" => Ok(DateWindow::PastYear),
            other => Err(format!("unknown date window: {other} (expected all, week, month or year)")),
        }
    }
}

/// Narrowing applied to a user's liked reviews.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LikedFilter {
    pub window: DateWindow,
    /// Keep only items crediting this artist; `None` means all artists
    pub artist: Option<String>,
}

impl LikedFilter {
    pub fn matches(&self, review: &Review, now: DateTime<Utc>) -> bool {
        self.window.contains(review.created_at, now) && self.matches_artist(review)
    }

    /// Case-insensitive match against any one of the credited artists.
    fn matches_artist(&self, review: &Review) -> bool {
        let Some(wanted) = self.artist.as_deref().map(|a| a.trim().to_lowercase()) else {
            return true;
        };
        review.item_artist.as_deref().is_some_and(|credited| {
            credited
                .split(", ")
                .any(|name| name.trim().to_lowercase() == wanted)
        })
    }
}

/// Distinct artists across `reviews`, sorted, for building an artist filter.
pub fn liked_artists(reviews: &[Review]) -> Vec<String> {
    reviews
        .iter()
        .filter_map(|r| r.item_artist.as_deref())
        .flat_map(|credited| credited.split(", "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Check a draft review before it is written.
pub fn validate(review: &NewReview) -> Result<(), ReviewError> {
    if review.item_id.trim().is_empty() {
        return Err(ReviewError::MissingItem);
    }
    if review.text.trim().is_empty() {
        return Err(ReviewError::EmptyText);
    }
    if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
        return Err(ReviewError::RatingOutOfRange(review.rating));
    }
    Ok(())
}

/// Trim tags, drop blanks and duplicates.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn to_document(author_id: &str, review: NewReview) -> Document {
    let mut doc = Document::new();
    doc.insert("itemId".into(), json!(review.item_id.trim()));
    doc.insert("userId".into(), json!(author_id));
    doc.insert("rating".into(), json!(review.rating));
    doc.insert("reviewText".into(), json!(review.text.trim()));
    doc.insert("tags".into(), json!(normalize_tags(&review.tags)));
    doc.insert("liked".into(), json!(review.liked));
    doc.insert("canReply".into(), json!(review.can_reply));

    let optional = [
        ("itemTitle", review.item_title),
        ("year", review.item_year),
        ("artist", review.item_artist),
        ("posterUrl", review.poster_url),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            doc.insert(key.into(), Value::String(value));
        }
    }
    doc
}

fn parse_all(rows: Vec<(String, Document)>) -> Vec<Review> {
    rows.into_iter()
        .filter_map(|(id, doc)| match Review::from_document(&id, doc) {
            Ok(review) => Some(review),
            Err(e) => {
                tracing::warn!(review_id = %id, error = %e, "Skipping malformed review");
                None
            }
        })
        .collect()
}

/// Review reads and writes for the signed-in user.
pub struct ReviewStore<D: Directory + ?Sized> {
    directory: Arc<D>,
}

impl<D: Directory + ?Sized> ReviewStore<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Validate and store a review authored by `session`'s user.
    pub async fn submit(&self, session: &Session, review: NewReview) -> Result<ReviewId, ReviewError> {
        validate(&review)?;

        let item_id = review.item_id.trim().to_string();
        let doc = to_document(&session.user_id, review);
        let id = self.directory.add_record(session, REVIEWS, doc).await?;

        tracing::info!(review_id = %id, item_id = %item_id, "Review submitted");
        Ok(ReviewId(id))
    }

    /// Reviews of one item, newest first.
    ///
    /// [`ReviewScope::CurrentUserOnly`] without a session yields nothing.
    pub async fn list_for(
        &self,
        item_id: &str,
        scope: ReviewScope,
        session: Option<&Session>,
    ) -> Result<Vec<Review>, ReviewError> {
        let author = match (scope, session) {
            (ReviewScope::Everyone, _) => None,
            (ReviewScope::CurrentUserOnly, Some(session)) => Some(session.user_id.as_str()),
            (ReviewScope::CurrentUserOnly, None) => return Ok(Vec::new()),
        };

        let rows = self
            .directory
            .query_records(REVIEWS, "itemId", &json!(item_id))
            .await?;
        let mut reviews: Vec<Review> = parse_all(rows)
            .into_iter()
            .filter(|r| author.is_none_or(|a| r.author_id == a))
            .collect();

        sort_reviews(&mut reviews, ReviewSort::NewestFirst);
        Ok(reviews)
    }

    /// Reviews a user marked as liked that pass `filter`, in the requested
    /// order.
    pub async fn liked_by(
        &self,
        user_id: &str,
        order: ReviewSort,
        filter: &LikedFilter,
    ) -> Result<Vec<Review>, ReviewError> {
        let rows = self
            .directory
            .query_records(REVIEWS, "userId", &json!(user_id))
            .await?;
        let now = Utc::now();
        let mut reviews: Vec<Review> = parse_all(rows)
            .into_iter()
            .filter(|r| r.liked && filter.matches(r, now))
            .collect();

        sort_reviews(&mut reviews, order);
        Ok(reviews)
    }
}

/// Refuses a second submission while one is still in flight.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `submit` unless another submission holds the guard.
    pub async fn run<F, T>(&self, submit: F) -> Result<T, ReviewError>
    where
        F: Future<Output = Result<T, ReviewError>>,
    {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ReviewError::SubmitInProgress);
        }
        let _in_flight = InFlight(&self.in_flight);
        submit.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::SqliteDirectory;
    use crate::model::{CatalogItem, ItemKind};
    use crate::test_utils::{doc, regular_user, temp_directory};

    async fn setup() -> (ReviewStore<SqliteDirectory>, Arc<SqliteDirectory>, tempfile::TempDir) {
        let (dir, tmp) = temp_directory().await;
        let dir = Arc::new(dir);
        (ReviewStore::new(dir.clone()), dir, tmp)
    }

    #[tokio::test]
    async fn test_submit_then_list_round_trip() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;
        let item = CatalogItem {
            id: "track-1".into(),
            title: "Song".into(),
            primary_artist: "Band".into(),
            kind: ItemKind::Track,
            year: "2021".into(),
            image_url: "https://img/1.jpg".into(),
        };

        let draft = NewReview::new("track-1", 4, "  Great hook  ")
            .for_item(&item)
            .with_tags(["pop", " pop ", "", "summer"]);
        let id = store.submit(&ana, draft).await.unwrap();

        let reviews = store
            .list_for("track-1", ReviewScope::Everyone, None)
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        let review = &reviews[0];
        assert_eq!(review.id, Some(id));
        assert_eq!(review.author_id, ana.user_id);
        assert_eq!(review.rating, 4);
        assert_eq!(review.text, "Great hook");
        assert_eq!(
            review.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["pop", "summer"]
        );
        assert_eq!(review.item_title.as_deref(), Some("Song"));
        assert_eq!(review.item_year.as_deref(), Some("2021"));
        assert_eq!(review.poster_url.as_deref(), Some("https://img/1.jpg"));
        assert!(review.can_reply);
    }

    #[tokio::test]
    async fn test_rating_boundaries() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;

        for rating in [0, 6] {
            let result = store.submit(&ana, NewReview::new("t", rating, "ok")).await;
            assert!(matches!(result, Err(ReviewError::RatingOutOfRange(r)) if r == rating));
        }
        for rating in [MIN_RATING, MAX_RATING] {
            assert!(store.submit(&ana, NewReview::new("t", rating, "ok")).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_blank_text_rejected_before_write() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;

        let result = store.submit(&ana, NewReview::new("t", 3, " \n\t")).await;

        assert!(matches!(result, Err(ReviewError::EmptyText)));
        assert!(dir.list_records(REVIEWS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scope_filters_by_author() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;
        let bob = regular_user(&dir, "bob@example.com", "Bob").await;
        store.submit(&ana, NewReview::new("t", 5, "ana's")).await.unwrap();
        store.submit(&bob, NewReview::new("t", 2, "bob's")).await.unwrap();
        store.submit(&bob, NewReview::new("other", 2, "elsewhere")).await.unwrap();

        let everyone = store.list_for("t", ReviewScope::Everyone, Some(&ana)).await.unwrap();
        let mine = store
            .list_for("t", ReviewScope::CurrentUserOnly, Some(&ana))
            .await
            .unwrap();
        let signed_out = store
            .list_for("t", ReviewScope::CurrentUserOnly, None)
            .await
            .unwrap();

        assert_eq!(everyone.len(), 2);
        assert_eq!(everyone[0].text, "bob's");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].text, "ana's");
        assert!(signed_out.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reviews_are_skipped() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;
        store.submit(&ana, NewReview::new("t", 5, "fine")).await.unwrap();
        dir.add_record(&ana, REVIEWS, doc(json!({"itemId": "t", "userId": ana.user_id})))
            .await
            .unwrap();

        let reviews = store.list_for("t", ReviewScope::Everyone, None).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, "fine");
    }

    #[tokio::test]
    async fn test_liked_by_sorts_both_ways() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;
        for (item, liked) in [("a", true), ("b", false), ("c", true)] {
            let mut draft = NewReview::new(item, 4, "text");
            draft.liked = liked;
            store.submit(&ana, draft).await.unwrap();
        }

        let all = LikedFilter::default();
        let newest = store
            .liked_by(&ana.user_id, ReviewSort::NewestFirst, &all)
            .await
            .unwrap();
        let oldest = store
            .liked_by(&ana.user_id, ReviewSort::OldestFirst, &all)
            .await
            .unwrap();

        let ids = |rs: &[Review]| rs.iter().map(|r| r.item_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&newest), vec!["c", "a"]);
        assert_eq!(ids(&oldest), vec!["a", "c"]);
    }

    fn track_by(id: &str, artist: &str) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            title: format!("Song {id}"),
            primary_artist: artist.into(),
            kind: ItemKind::Track,
            year: "2024".into(),
            image_url: String::new(),
        }
    }

    fn review_at(artist: Option<&str>, created_at: DateTime<Utc>) -> Review {
        Review {
            id: None,
            item_id: "t".into(),
            author_id: "u".into(),
            rating: 4,
            text: "text".into(),
            tags: BTreeSet::new(),
            created_at,
            liked: true,
            can_reply: true,
            item_title: None,
            item_year: None,
            item_artist: artist.map(str::to_string),
            poster_url: None,
        }
    }

    #[tokio::test]
    async fn test_liked_by_filters_by_artist_and_window() {
        let (store, dir, _tmp) = setup().await;
        let ana = regular_user(&dir, "ana@example.com", "Ana").await;
        let items = [
            track_by("a", "Bad Bunny"),
            track_by("b", "Mora, Jhayco"),
            track_by("c", "Karol G"),
        ];
        for item in &items {
            let mut draft = NewReview::new(&item.id, 5, "liked").for_item(item);
            draft.liked = true;
            store.submit(&ana, draft).await.unwrap();
        }
        let liked = |filter: LikedFilter| {
            let store = &store;
            let user_id = ana.user_id.clone();
            async move {
                store
                    .liked_by(&user_id, ReviewSort::OldestFirst, &filter)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|r| r.item_id)
                    .collect::<Vec<_>>()
            }
        };

        let jhayco = liked(LikedFilter {
            window: DateWindow::PastWeek,
            artist: Some("jhayco".into()),
        })
        .await;
        let this_year = liked(LikedFilter {
            window: DateWindow::PastYear,
            artist: None,
        })
        .await;
        let long_ago = liked(LikedFilter {
            window: DateWindow::Range {
                from: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2001, 12, 31).unwrap(),
            },
            artist: None,
        })
        .await;

        assert_eq!(jhayco, vec!["b"]);
        assert_eq!(this_year, vec!["a", "b", "c"]);
        assert!(long_ago.is_empty());
    }

    #[test]
    fn test_date_window_boundaries() {
        let now = DateTime::parse_from_rfc3339("2025-03-31T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let days_ago = |d: i64| now - TimeDelta::days(d);

        assert!(DateWindow::PastWeek.contains(days_ago(7), now));
        assert!(!DateWindow::PastWeek.contains(days_ago(8), now));
        // One calendar month before March 31 clamps to February 28
        assert!(DateWindow::PastMonth.contains(days_ago(31), now));
        assert!(!DateWindow::PastMonth.contains(days_ago(32), now));
        assert!(DateWindow::PastYear.contains(days_ago(365), now));
        assert!(!DateWindow::PastYear.contains(days_ago(366), now));
        assert!(DateWindow::All.contains(days_ago(10_000), now));

        let march = DateWindow::Range {
            from: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        };
        assert!(march.contains(now, now));
        assert!(march.contains(days_ago(30), now));
        assert!(!march.contains(days_ago(31), now));
    }

    #[test]
    fn test_artist_filter_matches_whole_names() {
        let now = Utc::now();
        let filter = LikedFilter {
            window: DateWindow::All,
            artist: Some(" BAD bunny ".into()),
        };

        assert!(filter.matches(&review_at(Some("Bad Bunny"), now), now));
        assert!(filter.matches(&review_at(Some("Jhayco, Bad Bunny"), now), now));
        assert!(!filter.matches(&review_at(Some("Bad Bunny Tribute Band"), now), now));
        assert!(!filter.matches(&review_at(None, now), now));
        assert!(LikedFilter::default().matches(&review_at(None, now), now));
    }

    #[test]
    fn test_date_window_parse_and_labels() {
        assert_eq!("Week".parse::<DateWindow>(), Ok(DateWindow::PastWeek));
        assert_eq!("year".parse::<DateWindow>(), Ok(DateWindow::PastYear));
        assert!("fortnight".parse::<DateWindow>().is_err());
        assert_eq!(DateWindow::default().label(), "All dates");
        assert_eq!(DateWindow::PastMonth.label(), "Past month");
    }

    #[test]
    fn test_liked_artists_are_distinct_and_sorted() {
        let now = Utc::now();
        let reviews = [
            review_at(Some("Mora, Jhayco"), now),
            review_at(Some("Bad Bunny"), now),
            review_at(Some("Jhayco"), now),
            review_at(None, now),
        ];

        assert_eq!(liked_artists(&reviews), vec!["Bad Bunny", "Jhayco", "Mora"]);
    }

    #[tokio::test]
    async fn test_guard_blocks_concurrent_submit() {
        let guard = SubmitGuard::new();
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = guard.run(async {
            wait.await.ok();
            Ok::<_, ReviewError>(1)
        });
        let second = async {
            tokio::task::yield_now().await;
            let blocked = guard.run(async { Ok::<_, ReviewError>(2) }).await;
            release.send(()).ok();
            blocked
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), 1);
        assert!(matches!(second, Err(ReviewError::SubmitInProgress)));
        let after = guard.run(async { Ok::<_, ReviewError>(3) }).await;
        assert_eq!(after.unwrap(), 3);
    }
}
