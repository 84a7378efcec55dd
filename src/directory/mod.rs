//! The Directory: document storage plus authentication.
//!
//! Everything user-related (profiles, reviews, accounts, sessions) goes
//! through the [`Directory`] trait. Writes carry the acting [`Session`] so
//! the directory can enforce its own access [`rules`]; client-side checks
//! elsewhere are convenience only.
//!
//! [`SqliteDirectory`] is the bundled implementation.

mod crypto;
pub mod rules;
mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::ErrorKind;
use crate::model::Session;

pub use sqlite::{DEFAULT_DB_NAME, SqliteDirectory, db_url};

/// A stored document: top-level field name → JSON value.
pub type Document = Map<String, Value>;

/// Collection holding `UserProfile`-shaped documents keyed by uid.
pub const USERS: &str = "users";
/// Collection holding `Review`-shaped documents keyed by generated id.
pub const REVIEWS: &str = "reviews";

/// Authentication state broadcast to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(Session),
}

/// Errors reported by a directory implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Malformed document {collection}/{id}: {message}")]
    Malformed {
        collection: String,
        id: String,
        message: String,
    },

    #[error("Email already in use: {0}")]
    EmailInUse(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Database(_)
            | DirectoryError::Migrate(_)
            | DirectoryError::PasswordHash(_)
            | DirectoryError::Malformed { .. } => ErrorKind::Internal,
            DirectoryError::EmailInUse(_) => ErrorKind::Validation,
            DirectoryError::InvalidCredentials | DirectoryError::SessionExpired => {
                ErrorKind::Authentication
            }
            DirectoryError::PermissionDenied(_) => ErrorKind::Authorization,
            DirectoryError::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}

/// Document store + authentication capability.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Register an account and return its uid. Does not sign in.
    async fn create_account(&self, email: &str, password: &str) -> Result<String, DirectoryError>;

    /// Verify credentials and open a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DirectoryError>;

    async fn sign_out(&self, session: &Session) -> Result<(), DirectoryError>;

    /// Request a password reset mail. Unknown addresses are accepted silently.
    async fn send_password_reset(&self, email: &str) -> Result<(), DirectoryError>;

    /// Remove the session's account and every session it holds.
    async fn delete_account(&self, session: &Session) -> Result<(), DirectoryError>;

    async fn get_record(&self, collection: &str, id: &str)
    -> Result<Option<Document>, DirectoryError>;

    /// Merge `fields` into `collection/id`, creating it if needed.
    async fn set_record(
        &self,
        actor: &Session,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), DirectoryError>;

    /// Create a document with a generated id and a server `createdAt`.
    async fn add_record(
        &self,
        actor: &Session,
        collection: &str,
        fields: Document,
    ) -> Result<String, DirectoryError>;

    async fn delete_record(
        &self,
        actor: &Session,
        collection: &str,
        id: &str,
    ) -> Result<(), DirectoryError>;

    /// Documents whose top-level `field` equals `value`, in insertion order.
    async fn query_records(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, DirectoryError>;

    /// Every document in a collection, in insertion order.
    async fn list_records(&self, collection: &str)
    -> Result<Vec<(String, Document)>, DirectoryError>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe_auth(&self) -> watch::Receiver<AuthState>;
}
