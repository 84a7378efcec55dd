//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while
//! the CLI uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum aggregating every subsystem
//! - Module-specific errors (e.g., [`CatalogError`], [`DirectoryError`])
//! - [`ErrorKind`]: the user-facing category each failure falls into
//!
//! # Example
//!
//! ```ignore
//! use tracklist::error::{Error, Result, ResultExt};
//!
//! async fn profile(service: &AccountService<D>, session: &Session) -> Result<UserProfile> {
//!     service
//!         .load_profile(&session.user_id)
//!         .await
//!         .with_context("Could not load profile")
//! }
//! ```

use crate::accounts::AccountError;
use crate::admin::AdminError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::directory::DirectoryError;
use crate::reviews::ReviewError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// User-facing failure category.
///
/// Every vendor failure is converted into one of these at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No network, DNS failure or timeout; retryable
    Transport,
    /// Bad credentials or expired session
    Authentication,
    /// Malformed input; blocks submission
    Validation,
    /// Unknown catalog id or missing directory record
    NotFound,
    /// Actor lacks the role for the operation
    Authorization,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Generic message shown to the user for this category.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "Network problem. Please check your connection and try again.",
            ErrorKind::Authentication => "Could not authenticate. Please sign in again.",
            ErrorKind::Validation => "Some fields are invalid.",
            ErrorKind::NotFound => "Nothing found.",
            ErrorKind::Authorization => "Access Denied.",
            ErrorKind::Internal => "Something went wrong.",
        }
    }
}

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Music catalog failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Directory (storage + auth) failure
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Review submission or listing failure
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Sign-up, sign-in or profile failure
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Role administration failure
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Catalog(e) => e.kind(),
            Error::Directory(e) => e.kind(),
            Error::Review(e) => e.kind(),
            Error::Account(e) => e.kind(),
            Error::Admin(e) => e.kind(),
            Error::Config(_) => ErrorKind::Internal,
            Error::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(ctx))
    }
}
