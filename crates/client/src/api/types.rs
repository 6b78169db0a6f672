//! Normalized domain types returned by the adapters.
//!
//! These are the shapes the stores and the presentation layer work with.
//! Wire payloads are mapped into them in `conversions`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use shelfmark_core::{
    BookmarkId, CurrencyCode, Email, GenreId, HexColor, ProductId, UserProfile, UserType,
};

// =============================================================================
// Auth
// =============================================================================

/// Registration payload. The adapter lower-cases the name before sending.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub user_type: UserType,
    pub preferred_currency: CurrencyCode,
}

/// Fields changed by a remote profile update. `None` fields are omitted from
/// the request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(
        rename = "preferedCurrency",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_currency: Option<CurrencyCode>,
}

/// Result of sign-in or a profile update.
///
/// Either half may be missing from the backend's response; the session
/// store decides what is acceptable.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One line of the cart, priced in the requested currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    pub author: String,
    pub image_url: Option<String>,
    pub converted_price: Decimal,
    pub selected: bool,
}

/// The cart as the backend reports it.
///
/// `total` is whatever the backend computed; it is never recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: Decimal,
}

impl Cart {
    /// An empty cart with a zero total.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// At least one item is selected.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.items.iter().any(|item| item.selected)
    }

    /// The cart is non-empty and every item is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.selected)
    }

    /// Items currently selected, in cart order.
    pub fn selected_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|item| item.selected)
    }

    /// Look up an item by product id.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// A purchased book in the local purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub product_id: ProductId,
    pub title: String,
    pub author: String,
    pub converted_price: Decimal,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    /// Record a removed cart item as purchased at `purchased_at`.
    #[must_use]
    pub fn from_cart_item(item: &CartItem, purchased_at: DateTime<Utc>) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title.clone(),
            author: item.author.clone(),
            converted_price: item.converted_price,
            purchased_at,
        }
    }
}

// =============================================================================
// Inventory & bookmarks
// =============================================================================

/// A user-defined colored tag.
///
/// The color is kept as the backend sent it; only colors going out are
/// validated (see [`BookmarkDraft`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    pub description: String,
    pub hex_color: String,
}

/// Description and color for creating or updating a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub description: String,
    pub hex_color: HexColor,
}

/// A book the user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub product_id: ProductId,
    pub title: String,
    pub author: String,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub bookmarks: Vec<Bookmark>,
}

impl InventoryEntry {
    /// Whether the book carries the given bookmark.
    #[must_use]
    pub fn has_bookmark(&self, id: BookmarkId) -> bool {
        self.bookmarks.iter().any(|b| b.id == id)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Search parameters for the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Free-text search; empty matches everything.
    pub search: String,
    /// Restrict to one genre tag.
    pub genre: Option<GenreId>,
}

impl BookQuery {
    /// Whether this query would return the unfiltered listing.
    #[must_use]
    pub fn is_listing(&self) -> bool {
        self.search.trim().is_empty() && self.genre.is_none()
    }
}

/// A catalog search result.
///
/// `is_favorite` and `bookmarks` are filled in by inventory enrichment; the
/// catalog itself always reports them as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBook {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub price: Option<Decimal>,
    /// Relative path for [`crate::api::CatalogApi::book`].
    pub detail_path: String,
    pub is_favorite: bool,
    pub bookmarks: Vec<Bookmark>,
}

/// Full catalog record for one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub price: Option<Decimal>,
    /// Remaining backend fields (synopsis, publisher, ...) passed through.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A genre tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

// =============================================================================
// Reviews
// =============================================================================

/// The book a review refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedBook {
    pub title: String,
    pub image_url: Option<String>,
}

/// A community review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// `<username>-<postDate>`; the backend has no review id.
    pub id: String,
    pub username: String,
    pub post_date: String,
    pub grade: Option<f64>,
    pub title: String,
    pub comment: String,
    pub book: ReviewedBook,
}
