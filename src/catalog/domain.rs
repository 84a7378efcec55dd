//! Internal catalog types that don't change when the vendor API changes.

use std::fmt;
use std::time::Duration;

use crate::error::ErrorKind;
use crate::model::CatalogItem;

/// Short-lived credential for catalog requests.
///
/// Never cached: each catalog call requests its own.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
}

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

// Keep tokens out of logs
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Result of a single-entity lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The entity, or the [`CatalogItem::unknown`] sentinel if the catalog
    /// could not be reached
    Found(CatalogItem),
    /// The catalog answered with a 4xx for this id
    NotFound,
}

/// Errors that can occur while talking to the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Token request failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API request failed: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl CatalogError {
    /// Map a reqwest failure, distinguishing timeouts.
    pub(crate) fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            CatalogError::Timeout(timeout)
        } else {
            CatalogError::Network(error.to_string())
        }
    }

    /// Whether the catalog rejected the request itself (HTTP 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CatalogError::Api { status, .. } if (400..500).contains(status))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Auth(_) => ErrorKind::Authentication,
            CatalogError::Network(_) | CatalogError::Timeout(_) => ErrorKind::Transport,
            CatalogError::Api { status: 401, .. } => ErrorKind::Authentication,
            CatalogError::Api { status: 404, .. } => ErrorKind::NotFound,
            CatalogError::Api { .. } | CatalogError::Parse(_) | CatalogError::Client(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert_eq!(token.header_value(), "Bearer super-secret");
    }

    #[test]
    fn test_client_error_classification() {
        let not_found = CatalogError::Api {
            status: 404,
            message: "non existing id".to_string(),
        };
        let server = CatalogError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(not_found.is_client_error());
        assert!(!server.is_client_error());
        assert!(!CatalogError::Timeout(Duration::from_secs(10)).is_client_error());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(
            CatalogError::Timeout(Duration::from_secs(10)).kind(),
            ErrorKind::Transport
        );
    }
}
