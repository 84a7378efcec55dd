//! Core data models shared by the catalog, review and account layers.
//!
//! Defines the primary entities: [`CatalogItem`], [`Artist`], [`Review`] and
//! [`UserProfile`], plus the [`Session`] issued by the directory.
//!
//! # Document Shapes
//!
//! Reviews and profiles live in the directory as JSON documents:
//! - `users/{uid}` - profile fields (`fullName`, `email`, `bio`, `role`, ...)
//! - `reviews/{id}` - review fields (`itemId`, `userId`, `rating`, ...)
//!
//! Conversion to and from those documents happens only through
//! [`UserProfile::from_document`], [`Review::from_document`] and the
//! matching `to_document` methods.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used for any catalog field the vendor did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Bio shown for profiles that never set one.
pub const DEFAULT_BIO: &str = "Hello! I'm new here.";

// ============================================================================
// Catalog
// ============================================================================

/// Kind of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Track,
    Album,
}

impl ItemKind {
    /// Name used by the catalog API (`type=track,album`, `/tracks/{id}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Track => "track",
            ItemKind::Album => "album",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Track => "Track",
            ItemKind::Album => "Album",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized track or album from the remote catalog.
///
/// Built only by the catalog adapter; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Vendor-assigned id, unique within the vendor namespace
    pub id: String,
    pub title: String,
    /// Every credited artist, joined with ", "
    pub primary_artist: String,
    pub kind: ItemKind,
    /// Four-digit year, or [`UNKNOWN`]
    pub year: String,
    /// First image of the entity, or empty
    pub image_url: String,
}

impl CatalogItem {
    /// Sentinel returned when a lookup fails for reasons other than "not found".
    pub fn unknown(id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN.to_string(),
            primary_artist: UNKNOWN.to_string(),
            kind,
            year: UNKNOWN.to_string(),
            image_url: String::new(),
        }
    }

    /// Whether this is the [`CatalogItem::unknown`] sentinel.
    pub fn is_unknown(&self) -> bool {
        self.title == UNKNOWN
            && self.primary_artist == UNKNOWN
            && self.year == UNKNOWN
            && self.image_url.is_empty()
    }
}

/// An artist as shown in a "related artists" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    /// Vendor genre labels, possibly empty
    pub genres: Vec<String>,
    /// First image of the artist, or empty
    pub image_url: String,
}

// ============================================================================
// Users
// ============================================================================

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Regular,
    Moderator,
    Admin,
}

impl Role {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "Regular",
            Role::Moderator => "Moderator",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(Role::Regular),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Profile stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "uid", default)]
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_bio", deserialize_with = "bio_or_default")]
    pub bio: String,
    #[serde(rename = "profilePicture", default)]
    pub avatar_url: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "dob", default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

fn default_bio() -> String {
    DEFAULT_BIO.to_string()
}

fn bio_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bio = Option::<String>::deserialize(deserializer)?;
    Ok(bio.filter(|b| !b.is_empty()).unwrap_or_else(default_bio))
}

impl UserProfile {
    /// Parse a `users/{uid}` document. The document id wins over any `uid` field.
    pub fn from_document(id: &str, doc: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut profile: UserProfile = serde_json::from_value(Value::Object(doc))?;
        profile.id = id.to_string();
        Ok(profile)
    }

    /// Serialize into a full `users/{uid}` document.
    pub fn to_document(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Authenticated session issued by the directory.
///
/// Passed explicitly to every operation that acts on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    /// Opaque session token checked by the directory on every write
    pub token: String,
}

// ============================================================================
// Reviews
// ============================================================================

/// Directory-assigned review id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which reviews to show for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewScope {
    #[default]
    Everyone,
    CurrentUserOnly,
}

/// A review as stored at `reviews/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(skip)]
    pub id: Option<ReviewId>,
    pub item_id: String,
    #[serde(rename = "userId")]
    pub author_id: String,
    pub rating: u8,
    #[serde(rename = "reviewText")]
    pub text: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Assigned by the directory at write time
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default = "default_can_reply")]
    pub can_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_title: Option<String>,
    #[serde(rename = "year", default, skip_serializing_if = "Option::is_none")]
    pub item_year: Option<String>,
    /// Credited artists of the item, joined with ", "
    #[serde(rename = "artist", default, skip_serializing_if = "Option::is_none")]
    pub item_artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

fn default_can_reply() -> bool {
    true
}

impl Review {
    /// Parse a `reviews/{id}` document.
    pub fn from_document(id: &str, doc: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut review: Review = serde_json::from_value(Value::Object(doc))?;
        review.id = Some(ReviewId(id.to_string()));
        Ok(review)
    }
}

/// A review as composed by the author, before the directory stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewReview {
    pub item_id: String,
    pub rating: u8,
    pub text: String,
    pub tags: Vec<String>,
    pub liked: bool,
    pub can_reply: bool,
    pub item_title: Option<String>,
    pub item_year: Option<String>,
    pub item_artist: Option<String>,
    pub poster_url: Option<String>,
}

impl NewReview {
    pub fn new(item_id: impl Into<String>, rating: u8, text: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            rating,
            text: text.into(),
            can_reply: true,
            ..Default::default()
        }
    }

    /// Attach descriptive fields of the reviewed item.
    pub fn for_item(mut self, item: &CatalogItem) -> Self {
        self.item_title = Some(item.title.clone());
        self.item_year = Some(item.year.clone());
        self.item_artist = Some(item.primary_artist.clone());
        if !item.image_url.is_empty() {
            self.poster_url = Some(item.image_url.clone());
        }
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_sentinel() {
        let item = CatalogItem::unknown("abc", ItemKind::Track);
        assert!(item.is_unknown());
        assert_eq!(item.year, "Unknown");
        assert!(item.image_url.is_empty());
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_profile_defaults_for_missing_fields() {
        let doc = json!({ "fullName": "Ana", "email": "ana@example.com" });
        let Value::Object(map) = doc else { unreachable!() };

        let profile = UserProfile::from_document("uid-1", map).unwrap();

        assert_eq!(profile.id, "uid-1");
        assert_eq!(profile.role, Role::Regular);
        assert_eq!(profile.bio, DEFAULT_BIO);
        assert!(profile.avatar_url.is_empty());
    }

    #[test]
    fn test_profile_document_uses_original_field_names() {
        let profile = UserProfile {
            id: "u1".to_string(),
            display_name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            bio: "hi".to_string(),
            avatar_url: "a.png".to_string(),
            role: Role::Moderator,
            phone: None,
            date_of_birth: None,
        };

        let doc = profile.to_document();

        assert_eq!(doc["fullName"], "Ana");
        assert_eq!(doc["profilePicture"], "a.png");
        assert_eq!(doc["role"], "Moderator");
        assert_eq!(doc["uid"], "u1");
        assert!(!doc.contains_key("phone"));
    }

    #[test]
    fn test_review_from_document() {
        let doc = json!({
            "itemId": "track-1",
            "userId": "u1",
            "rating": 4,
            "reviewText": "Great",
            "tags": ["summer", "latin"],
            "createdAt": "2025-01-05T12:00:00Z"
        });
        let Value::Object(map) = doc else { unreachable!() };

        let review = Review::from_document("r1", map).unwrap();

        assert_eq!(review.id, Some(ReviewId("r1".to_string())));
        assert_eq!(review.rating, 4);
        assert!(review.tags.contains("latin"));
        assert!(review.can_reply);
        assert!(!review.liked);
        assert!(review.item_artist.is_none());
    }

    #[test]
    fn test_new_review_for_item() {
        let item = CatalogItem {
            id: "t1".to_string(),
            title: "DtMF".to_string(),
            primary_artist: "Bad Bunny".to_string(),
            kind: ItemKind::Track,
            year: "2025".to_string(),
            image_url: String::new(),
        };

        let review = NewReview::new("t1", 5, "Classic").for_item(&item);

        assert_eq!(review.item_title.as_deref(), Some("DtMF"));
        assert_eq!(review.item_year.as_deref(), Some("2025"));
        assert_eq!(review.item_artist.as_deref(), Some("Bad Bunny"));
        assert!(review.poster_url.is_none());
        assert!(review.can_reply);
    }
}
