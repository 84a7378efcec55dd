//! Music catalog access - token exchange, search and lookups.
//!
//! # Architecture
//!
//! Mirrors a clean separation between:
//! - **Domain types** (`domain.rs`) - [`BearerToken`], [`Lookup`], [`CatalogError`]
//! - **API DTOs** (`dto.rs`) - exact vendor response shapes
//! - **Adapter** (`adapter.rs`) - the single DTO → [`CatalogItem`](crate::model::CatalogItem) boundary
//! - **Clients** - [`TokenProvider`] and [`CatalogClient`]
//! - **Session** - [`SearchSession`], per-screen stale-response guard
//!
//! # Usage
//!
//! ```ignore
//! use tracklist::catalog::CatalogClient;
//!
//! let client = CatalogClient::from_config(&config.catalog)?;
//! for item in client.search("Bad Bunny").await {
//!     println!("{} - {} ({})", item.title, item.primary_artist, item.year);
//! }
//! ```

pub mod adapter;
mod client;
pub mod domain;
pub mod dto;
mod session;
#[cfg(test)]
pub(crate) mod test_server;
mod token;
pub mod traits;

pub use client::CatalogClient;
pub use domain::{BearerToken, CatalogError, Lookup};
pub use session::{KindFilter, SearchOutcome, SearchSession};
pub use token::TokenProvider;
pub use traits::{CatalogApi, TokenSource};
