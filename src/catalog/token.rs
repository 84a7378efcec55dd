//! Client-credentials token provider
//!
//! Exchanges the configured client id/secret for a bearer token with a
//! form-encoded POST. Tokens are never cached: every catalog call asks for
//! a fresh one, so call volume here tracks catalog call volume.

use std::time::Duration;

use super::domain::{BearerToken, CatalogError};
use super::dto;

/// Token endpoint client
pub struct TokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl TokenProvider {
    /// Create a provider for the given endpoint and credentials.
    ///
    /// `timeout` bounds each token request.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
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
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        })
    }

    /// Request a new bearer token.
    ///
    /// Network errors, non-2xx responses and bodies without an
    /// `access_token` all fail with [`CatalogError::Auth`] or a transport
    /// error; there is no partial token.
    pub async fn get_token(&self) -> Result<BearerToken, CatalogError> {
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret)
        );

        let response = self
            .http_client
            .post(&self.token_url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| CatalogError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<dto::TokenError>().await {
                Ok(error) => error.error_description.unwrap_or(error.error),
                Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
            };
            return Err(CatalogError::Auth(format!("HTTP {}: {}", status.as_u16(), detail)));
        }

        let token = response
            .json::<dto::TokenResponse>()
            .await
            .map_err(|e| CatalogError::Auth(format!("unexpected token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(CatalogError::Auth("empty access token".to_string()));
        }

        tracing::debug!("Obtained catalog token");
        Ok(BearerToken::new(token.access_token))
    }
}
