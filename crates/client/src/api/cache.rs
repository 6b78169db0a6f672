//! Cache types for catalog responses.

use shelfmark_core::{CurrencyCode, ProductId};

use super::types::{BookDetail, CatalogBook, Genre};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Book { id: ProductId, currency: CurrencyCode },
    Listing { currency: CurrencyCode },
    Genres,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Book(Box<BookDetail>),
    Listing(Vec<CatalogBook>),
    Genres(Vec<Genre>),
}
