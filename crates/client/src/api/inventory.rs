//! Inventory and bookmark backend adapter (`/ws/inventory`).

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use shelfmark_core::{BookmarkId, ProductId};
use tracing::instrument;

use super::cart::ProductRef;
use super::conversions::{
    ListOrPage, Page, WireBookmark, WireInventoryBook, convert_bookmarks, convert_inventory,
};
use super::http::HttpClient;
use super::types::{Bookmark, BookmarkDraft, InventoryEntry};
use super::{ApiError, BookmarkApi, InventoryApi};

#[derive(Serialize)]
struct AddBooksBody {
    items: Vec<ProductRef>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkBooksBody {
    product_ids: Vec<ProductRef>,
}

/// Client for the user's owned books and bookmarks.
#[derive(Clone)]
pub struct InventoryClient {
    http: HttpClient,
}

impl InventoryClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn put_bookmark_books(
        &self,
        action: &str,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError> {
        let body = BookmarkBooksBody {
            product_ids: ProductRef::list(product_ids),
        };
        let url = self
            .http
            .url(&format!("ws/inventory/bookmarks/{action}/{id}"))?;
        self.http
            .execute_discard(self.http.request(Method::PUT, url).json(&body))
            .await
    }
}

#[async_trait]
impl InventoryApi for InventoryClient {
    #[instrument(skip(self))]
    async fn get_inventory(&self) -> Result<Vec<InventoryEntry>, ApiError> {
        let url = self.http.url("ws/inventory")?;
        let page: Option<Page<WireInventoryBook>> = self
            .http
            .execute_optional(self.http.request(Method::GET, url))
            .await?;
        Ok(page.map(convert_inventory).unwrap_or_default())
    }

    #[instrument(skip(self), fields(count = product_ids.len()))]
    async fn add_books(&self, product_ids: &[ProductId]) -> Result<(), ApiError> {
        let body = AddBooksBody {
            items: ProductRef::list(product_ids),
        };
        let url = self.http.url("ws/inventory")?;
        self.http
            .execute_discard(self.http.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn toggle_favorite(&self, product_id: ProductId) -> Result<(), ApiError> {
        let url = self
            .http
            .url(&format!("ws/inventory/favorite/{product_id}"))?;
        self.http
            .execute_discard(self.http.request(Method::PUT, url))
            .await
    }
}

#[async_trait]
impl BookmarkApi for InventoryClient {
    #[instrument(skip(self))]
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError> {
        let url = self.http.url("ws/inventory/bookmarks")?;
        let wire: Option<ListOrPage<WireBookmark>> = self
            .http
            .execute_optional(self.http.request(Method::GET, url))
            .await?;
        Ok(wire
            .map(|w| convert_bookmarks(w.into_vec()))
            .unwrap_or_default())
    }

    #[instrument(skip(self, draft), fields(color = %draft.hex_color))]
    async fn create_bookmark(&self, draft: &BookmarkDraft) -> Result<(), ApiError> {
        let url = self.http.url("ws/inventory/bookmarks")?;
        self.http
            .execute_discard(self.http.request(Method::POST, url).json(draft))
            .await
    }

    #[instrument(skip(self, draft), fields(bookmark_id = %id))]
    async fn update_bookmark(
        &self,
        id: BookmarkId,
        draft: &BookmarkDraft,
    ) -> Result<(), ApiError> {
        let url = self.http.url(&format!("ws/inventory/bookmarks/{id}"))?;
        self.http
            .execute_discard(self.http.request(Method::PUT, url).json(draft))
            .await
    }

    #[instrument(skip(self), fields(bookmark_id = %id))]
    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), ApiError> {
        let url = self.http.url(&format!("ws/inventory/bookmarks/{id}"))?;
        self.http
            .execute_discard(self.http.request(Method::DELETE, url))
            .await
    }

    #[instrument(skip(self), fields(bookmark_id = %id, count = product_ids.len()))]
    async fn add_bookmark_to_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError> {
        self.put_bookmark_books("add", id, product_ids).await
    }

    #[instrument(skip(self), fields(bookmark_id = %id, count = product_ids.len()))]
    async fn remove_bookmark_from_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError> {
        self.put_bookmark_books("remove", id, product_ids).await
    }
}
