//! Wire payloads and their mapping to the normalized types.
//!
//! The backend is inconsistent about envelopes and field names, so every
//! wire struct is lenient: missing fields default, and records without an
//! identifier are dropped with a warning instead of failing the whole
//! response.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use shelfmark_core::{BookmarkId, CurrencyCode, GenreId, ProductId, UserProfile};
use tracing::warn;

use super::types::{
    AuthSession, BookDetail, Bookmark, Cart, CartItem, CatalogBook, Genre, InventoryEntry,
    Review, ReviewedBook,
};

const UNTITLED: &str = "Untitled";
const UNKNOWN_AUTHOR: &str = "Unknown author";
const UNSPECIFIED_BOOK: &str = "Unspecified book";

// =============================================================================
// Envelopes
// =============================================================================

/// `{ "content": [...] }`
#[derive(Debug, Deserialize)]
pub(super) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
}

/// Either a bare array or a `content` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListOrPage<T> {
    List(Vec<T>),
    Page(Page<T>),
}

impl<T> ListOrPage<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Page(page) => page.content,
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireAuth {
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default)]
    token: Option<String>,
}

/// Map an auth response.
///
/// Sign-in answers `{ user, token }`; profile updates may answer with the
/// bare user object instead.
pub(super) fn convert_auth(body: Value) -> Result<AuthSession, serde_json::Error> {
    let wrapped = body
        .as_object()
        .is_some_and(|obj| obj.contains_key("user") || obj.contains_key("token"));

    if wrapped {
        let wire: WireAuth = serde_json::from_value(body)?;
        Ok(AuthSession {
            user: wire.user,
            token: wire.token.filter(|t| !t.trim().is_empty()),
        })
    } else {
        let user: UserProfile = serde_json::from_value(body)?;
        Ok(AuthSession {
            user: Some(user),
            token: None,
        })
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireCart {
    #[serde(default)]
    items: Option<Page<WireCartItem>>,
    #[serde(default)]
    total_value: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireCartItem {
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    id: Option<ProductId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    converted_price: Option<Decimal>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    selected: Option<bool>,
}

pub(super) fn convert_cart(wire: WireCart) -> Cart {
    let items = wire
        .items
        .map(|page| page.content)
        .unwrap_or_default()
        .into_iter()
        .filter_map(convert_cart_item)
        .collect();

    Cart {
        items,
        total: wire.total_value.unwrap_or_default(),
    }
}

pub(super) fn convert_cart_item(wire: WireCartItem) -> Option<CartItem> {
    let Some(product_id) = wire.product_id.or(wire.id) else {
        warn!(title = ?wire.title, "Dropping cart item without a product id");
        return None;
    };

    Some(CartItem {
        product_id,
        title: non_empty_or(wire.title, UNTITLED),
        author: non_empty_or(wire.author, UNKNOWN_AUTHOR),
        image_url: wire.image_url.filter(|url| !url.trim().is_empty()),
        converted_price: wire.converted_price.or(wire.price).unwrap_or_default(),
        selected: wire.selected.unwrap_or(false),
    })
}

// =============================================================================
// Inventory & bookmarks
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireBookmark {
    #[serde(default)]
    bookmark_id: Option<BookmarkId>,
    #[serde(default)]
    id: Option<BookmarkId>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hex_color: Option<String>,
}

pub(super) fn convert_bookmark(wire: WireBookmark) -> Option<Bookmark> {
    let Some(id) = wire.bookmark_id.or(wire.id) else {
        warn!(description = ?wire.description, "Dropping bookmark without an id");
        return None;
    };

    Some(Bookmark {
        id,
        description: wire.description.unwrap_or_default(),
        hex_color: wire.hex_color.unwrap_or_default(),
    })
}

pub(super) fn convert_bookmarks(wire: Vec<WireBookmark>) -> Vec<Bookmark> {
    wire.into_iter().filter_map(convert_bookmark).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireInventoryBook {
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    favorite: Option<bool>,
    #[serde(default)]
    bookmarks_list: Option<Vec<WireBookmark>>,
}

pub(super) fn convert_inventory_entry(wire: WireInventoryBook) -> Option<InventoryEntry> {
    let Some(product_id) = wire.product_id else {
        warn!(title = ?wire.title, "Dropping inventory entry without a product id");
        return None;
    };

    Some(InventoryEntry {
        product_id,
        title: non_empty_or(wire.title, UNTITLED),
        author: non_empty_or(wire.author, UNKNOWN_AUTHOR),
        image_url: wire.image_url.filter(|url| !url.trim().is_empty()),
        is_favorite: wire.favorite.unwrap_or(false),
        bookmarks: convert_bookmarks(wire.bookmarks_list.unwrap_or_default()),
    })
}

pub(super) fn convert_inventory(wire: Page<WireInventoryBook>) -> Vec<InventoryEntry> {
    wire.content
        .into_iter()
        .filter_map(convert_inventory_entry)
        .collect()
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireProduct {
    id: ProductId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    converted_price: Option<Decimal>,
    #[serde(default)]
    price: Option<Decimal>,
}

/// Relative path of a book's detail endpoint.
pub(super) fn detail_path(id: ProductId, currency: &CurrencyCode) -> String {
    format!("products/{id}/{currency}")
}

/// Escape spaces in a cover URL, or fall back to a placeholder image seeded
/// by the product id.
pub(super) fn cover_image(id: ProductId, cover_url: Option<&str>) -> String {
    match cover_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => url.replace(' ', "%20"),
        None => format!("https://picsum.photos/seed/{id}/200/300"),
    }
}

pub(super) fn convert_product(wire: WireProduct, currency: &CurrencyCode) -> CatalogBook {
    CatalogBook {
        id: wire.id,
        title: non_empty_or(wire.title, UNTITLED),
        author: non_empty_or(wire.author, UNKNOWN_AUTHOR),
        image_url: cover_image(wire.id, wire.cover_url.as_deref()),
        price: wire.converted_price.or(wire.price),
        detail_path: detail_path(wire.id, currency),
        is_favorite: false,
        bookmarks: Vec::new(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireBookDetail {
    id: ProductId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    converted_price: Option<Decimal>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

pub(super) fn convert_book_detail(wire: WireBookDetail) -> BookDetail {
    BookDetail {
        id: wire.id,
        title: non_empty_or(wire.title, UNTITLED),
        author: non_empty_or(wire.author, UNKNOWN_AUTHOR),
        image_url: cover_image(wire.id, wire.cover_url.as_deref()),
        price: wire.converted_price.or(wire.price),
        attributes: wire.rest,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireGenre {
    #[serde(default)]
    id: Option<GenreId>,
    #[serde(default)]
    tag_id: Option<GenreId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub(super) fn convert_genres(wire: ListOrPage<WireGenre>) -> Vec<Genre> {
    wire.into_vec()
        .into_iter()
        .filter_map(|genre| {
            let id = genre.id.or(genre.tag_id)?;
            let name = genre.name.or(genre.description).unwrap_or_default();
            Some(Genre { id, name })
        })
        .collect()
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireReviewedBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireReview {
    #[serde(default)]
    username: String,
    #[serde(default)]
    post_date: Value,
    #[serde(default)]
    grade: Option<f64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    book: Option<WireReviewedBook>,
}

pub(super) fn convert_review(wire: WireReview) -> Review {
    let post_date = match wire.post_date {
        Value::String(date) => date,
        Value::Null => String::new(),
        other => other.to_string(),
    };

    let book = wire.book.map_or_else(
        || ReviewedBook {
            title: UNSPECIFIED_BOOK.to_string(),
            image_url: None,
        },
        |book| ReviewedBook {
            title: non_empty_or(book.title, UNSPECIFIED_BOOK),
            image_url: book.image_url,
        },
    );

    Review {
        id: format!("{}-{post_date}", wire.username),
        username: wire.username,
        post_date,
        grade: wire.grade,
        title: wire.title,
        comment: wire.comment,
        book,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_cart_envelope() {
        let wire: WireCart = serde_json::from_value(json!({
            "items": { "content": [
                { "productId": 1, "title": "Dune", "author": "Frank Herbert",
                  "convertedPrice": 39.9, "selected": false },
                { "productId": 2, "title": "Emma", "author": "Jane Austen",
                  "convertedPrice": "12.50", "selected": true }
            ]},
            "totalValue": 52.4
        }))
        .unwrap();

        let cart = convert_cart(wire);
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].converted_price, Decimal::new(399, 1));
        assert_eq!(cart.items[1].converted_price, Decimal::new(1250, 2));
        assert!(cart.items[1].selected);
        assert_eq!(cart.total, Decimal::new(524, 1));
    }

    #[test]
    fn test_convert_cart_missing_items_is_empty() {
        let wire: WireCart = serde_json::from_value(json!({})).unwrap();
        let cart = convert_cart(wire);
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[test]
    fn test_cart_item_without_id_is_dropped() {
        let wire: WireCart = serde_json::from_value(json!({
            "items": { "content": [ { "title": "Orphan" } ] },
            "totalValue": 0
        }))
        .unwrap();
        assert!(convert_cart(wire).is_empty());
    }

    #[test]
    fn test_inventory_maps_favorite_and_defaults_bookmarks() {
        let wire: Page<WireInventoryBook> = serde_json::from_value(json!({
            "content": [
                { "productId": 42, "title": "Dune", "author": "Frank Herbert",
                  "imageUrl": "https://img/dune.jpg", "favorite": true },
                { "productId": 43, "title": "Emma", "author": "Jane Austen",
                  "bookmarksList": [ { "bookmarkId": 7, "description": "Classics", "hexColor": "#FF0000" } ] }
            ]
        }))
        .unwrap();

        let entries = convert_inventory(wire);
        assert!(entries[0].is_favorite);
        assert!(entries[0].bookmarks.is_empty());
        assert!(!entries[1].is_favorite);
        assert_eq!(entries[1].bookmarks[0].id, BookmarkId::new(7));
        assert!(entries[1].has_bookmark(BookmarkId::new(7)));
    }

    #[test]
    fn test_bookmark_accepts_either_id_spelling() {
        let a: WireBookmark =
            serde_json::from_value(json!({ "bookmarkId": 5, "description": "x" })).unwrap();
        let b: WireBookmark =
            serde_json::from_value(json!({ "id": 6, "description": "y" })).unwrap();
        assert_eq!(convert_bookmark(a).unwrap().id, BookmarkId::new(5));
        assert_eq!(convert_bookmark(b).unwrap().id, BookmarkId::new(6));
    }

    #[test]
    fn test_convert_product_defaults() {
        let wire: WireProduct = serde_json::from_value(json!({
            "id": 9, "coverUrl": "https://img/my cover.jpg", "price": 20
        }))
        .unwrap();
        let book = convert_product(wire, &CurrencyCode::fallback());

        assert_eq!(book.title, "Untitled");
        assert_eq!(book.author, "Unknown author");
        assert_eq!(book.image_url, "https://img/my%20cover.jpg");
        assert_eq!(book.price, Some(Decimal::from(20)));
        assert_eq!(book.detail_path, "products/9/BRL");
    }

    #[test]
    fn test_convert_product_prefers_converted_price_and_placeholder() {
        let wire: WireProduct = serde_json::from_value(json!({
            "id": 3, "title": "Dune", "author": "Frank Herbert",
            "convertedPrice": 7.5, "price": 40
        }))
        .unwrap();
        let book = convert_product(wire, &CurrencyCode::parse("USD").unwrap());
        assert_eq!(book.price, Some(Decimal::new(75, 1)));
        assert_eq!(book.image_url, "https://picsum.photos/seed/3/200/300");
        assert_eq!(book.detail_path, "products/3/USD");
    }

    #[test]
    fn test_book_detail_keeps_extra_fields() {
        let wire: WireBookDetail = serde_json::from_value(json!({
            "id": 3, "title": "Dune", "author": "Frank Herbert",
            "synopsis": "Spice.", "pages": 412
        }))
        .unwrap();
        let detail = convert_book_detail(wire);
        assert_eq!(detail.attributes.get("synopsis"), Some(&json!("Spice.")));
        assert_eq!(detail.attributes.get("pages"), Some(&json!(412)));
        assert!(!detail.attributes.contains_key("title"));
    }

    #[test]
    fn test_genres_accept_both_shapes() {
        let bare: ListOrPage<WireGenre> =
            serde_json::from_value(json!([{ "id": 1, "name": "Fantasy" }])).unwrap();
        let page: ListOrPage<WireGenre> = serde_json::from_value(json!({
            "content": [{ "id": 2, "name": "Horror" }]
        }))
        .unwrap();

        assert_eq!(convert_genres(bare)[0].name, "Fantasy");
        assert_eq!(convert_genres(page)[0].id, GenreId::new(2));
    }

    #[test]
    fn test_review_id_and_missing_book() {
        let wire: WireReview = serde_json::from_value(json!({
            "username": "ana", "postDate": "2024-05-01", "grade": 4,
            "title": "Great", "comment": "Loved it"
        }))
        .unwrap();
        let review = convert_review(wire);
        assert_eq!(review.id, "ana-2024-05-01");
        assert_eq!(review.book.title, "Unspecified book");
        assert_eq!(review.grade, Some(4.0));
    }

    #[test]
    fn test_convert_auth_shapes() {
        let session = convert_auth(json!({
            "user": { "id": 1, "name": "ana", "email": "ana@example.com", "preferedCurrency": "USD" },
            "token": "abc"
        }))
        .unwrap();
        assert_eq!(session.token.as_deref(), Some("abc"));
        assert_eq!(session.user.unwrap().currency().as_str(), "USD");

        let bare = convert_auth(json!({ "name": "ana", "email": "ana@example.com" })).unwrap();
        assert!(bare.token.is_none());
        assert_eq!(bare.user.unwrap().name, "ana");

        let blank_token = convert_auth(json!({ "user": null, "token": "  " })).unwrap();
        assert!(blank_token.user.is_none());
        assert!(blank_token.token.is_none());
    }
}
