//! REST adapters for the Shelfmark backend services.
//!
//! # Architecture
//!
//! - One adapter per backend domain (auth, cart, inventory, catalog, reviews)
//! - Every adapter shares an [`HttpClient`] that attaches the bearer token
//!   read from local storage on each request
//! - Raw payloads are mapped to the normalized shapes in [`types`] by
//!   `conversions`; stores never see wire structs
//! - The backend is the source of truth - no local sync, direct API calls
//! - Book details and genre tags are cached in memory via `moka`
//!
//! Each domain is exposed to the stores through a trait ([`AuthApi`],
//! [`CartApi`], [`InventoryApi`], [`BookmarkApi`], [`CatalogApi`],
//! [`ReviewApi`]) so stores can be driven by an in-memory backend in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelfmark_client::api::{CartApi, CartClient, HttpClient};
//!
//! let http = HttpClient::new(config.api_url.clone(), config.request_timeout, storage)?;
//! let cart = CartClient::new(http);
//!
//! let current = cart.get_cart(&CurrencyCode::fallback()).await?;
//! cart.toggle_selection(current.items[0].product_id, &CurrencyCode::fallback()).await?;
//! ```

mod auth;
mod cache;
mod cart;
mod catalog;
mod conversions;
mod http;
mod inventory;
mod reviews;
pub mod types;

pub use auth::AuthClient;
pub use cart::CartClient;
pub use catalog::CatalogClient;
pub use http::HttpClient;
pub use inventory::InventoryClient;
pub use reviews::ReviewClient;
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use shelfmark_core::{BookmarkId, CurrencyCode, Email, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend rejected the credentials (expired or missing token).
    #[error("Unauthorized (HTTP {0})")]
    Unauthorized(u16),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// =============================================================================
// Backend traits
// =============================================================================

/// Registration, login and profile updates.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Register a new account. Registration does not log the user in.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError>;

    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<AuthSession, ApiError>;

    /// Update profile fields; returns the server's canonical user.
    async fn update_user(&self, update: &UserUpdate) -> Result<AuthSession, ApiError>;
}

/// Cart contents and selection.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Read the cart with prices converted to `currency`.
    async fn get_cart(&self, currency: &CurrencyCode) -> Result<Cart, ApiError>;

    /// Add a product to the cart.
    async fn add_item(&self, product_id: ProductId) -> Result<(), ApiError>;

    /// Flip the selection flag of one cart item.
    async fn toggle_selection(
        &self,
        product_id: ProductId,
        currency: &CurrencyCode,
    ) -> Result<(), ApiError>;

    /// Delete every selected item. The backend treats this as the checkout:
    /// the returned items are the ones removed (purchased).
    async fn delete_selected(&self) -> Result<Vec<CartItem>, ApiError>;
}

/// Owned books and favorites.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Every book the user owns.
    async fn get_inventory(&self) -> Result<Vec<InventoryEntry>, ApiError>;

    /// Add books to the user's inventory.
    async fn add_books(&self, product_ids: &[ProductId]) -> Result<(), ApiError>;

    /// Flip the favorite flag of an owned book.
    async fn toggle_favorite(&self, product_id: ProductId) -> Result<(), ApiError>;
}

/// Bookmark (tag) CRUD and book association.
#[async_trait]
pub trait BookmarkApi: Send + Sync {
    /// All bookmarks of the current user.
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError>;

    /// Create a bookmark.
    async fn create_bookmark(&self, draft: &BookmarkDraft) -> Result<(), ApiError>;

    /// Replace a bookmark's description and color.
    async fn update_bookmark(&self, id: BookmarkId, draft: &BookmarkDraft)
    -> Result<(), ApiError>;

    /// Delete a bookmark (and its association with every book).
    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), ApiError>;

    /// Tag books with a bookmark.
    async fn add_bookmark_to_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError>;

    /// Untag books.
    async fn remove_bookmark_from_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError>;
}

/// Public catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search books, prices converted to `currency`.
    async fn search_books(
        &self,
        query: &BookQuery,
        currency: &CurrencyCode,
    ) -> Result<Vec<CatalogBook>, ApiError>;

    /// Full details of one book.
    async fn book(&self, id: ProductId, currency: &CurrencyCode) -> Result<BookDetail, ApiError>;

    /// Genre tags used to filter searches.
    async fn genres(&self) -> Result<Vec<Genre>, ApiError>;
}

/// Community reviews.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// Every published review.
    async fn reviews(&self) -> Result<Vec<Review>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("/ws/cart/BRL".to_string());
        assert_eq!(err.to_string(), "Not found: /ws/cart/BRL");

        let err = ApiError::Status {
            status: 422,
            message: "invalid color".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 422 - invalid color");
    }
}
