//! Cart backend adapter (`/ws/cart`).

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use shelfmark_core::{CurrencyCode, ProductId};
use tracing::{debug, instrument};

use super::conversions::{ListOrPage, WireCart, WireCartItem, convert_cart, convert_cart_item};
use super::http::HttpClient;
use super::types::{Cart, CartItem};
use super::{ApiError, CartApi};

/// `{ "productId": 1 }`, the element shape of every id list the backend takes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductRef {
    pub product_id: ProductId,
}

impl ProductRef {
    pub fn list(ids: &[ProductId]) -> Vec<Self> {
        ids.iter().map(|&product_id| Self { product_id }).collect()
    }
}

#[derive(Serialize)]
struct AddItemsBody {
    items: Vec<ProductRef>,
}

/// Client for the user's cart.
#[derive(Clone)]
pub struct CartClient {
    http: HttpClient,
}

impl CartClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CartApi for CartClient {
    #[instrument(skip(self), fields(currency = %currency))]
    async fn get_cart(&self, currency: &CurrencyCode) -> Result<Cart, ApiError> {
        let url = self.http.url(&format!("ws/cart/{currency}"))?;
        let wire: Option<WireCart> = self
            .http
            .execute_optional(self.http.request(Method::GET, url))
            .await?;
        Ok(wire.map(convert_cart).unwrap_or_default())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        let body = AddItemsBody {
            items: ProductRef::list(&[product_id]),
        };
        let url = self.http.url("ws/cart")?;
        self.http
            .execute_discard(self.http.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id, currency = %currency))]
    async fn toggle_selection(
        &self,
        product_id: ProductId,
        currency: &CurrencyCode,
    ) -> Result<(), ApiError> {
        let url = self
            .http
            .url(&format!("ws/cart/select/{product_id}/{currency}"))?;
        self.http
            .execute_discard(self.http.request(Method::PUT, url))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_selected(&self) -> Result<Vec<CartItem>, ApiError> {
        let url = self.http.url("ws/cart")?;
        let removed: Option<ListOrPage<WireCartItem>> = self
            .http
            .execute_optional(self.http.request(Method::DELETE, url))
            .await?;

        let items: Vec<CartItem> = removed
            .map(ListOrPage::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(convert_cart_item)
            .collect();
        debug!(count = items.len(), "Deleted selected cart items");
        Ok(items)
    }
}
