//! Review service adapter (`/reviews/*`).

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use super::conversions::{Page, WireReview, convert_review};
use super::http::HttpClient;
use super::types::Review;
use super::{ApiError, ReviewApi};

/// Client for community reviews. May point at a different base URL than the
/// rest of the backend.
#[derive(Clone)]
pub struct ReviewClient {
    http: HttpClient,
}

impl ReviewClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReviewApi for ReviewClient {
    #[instrument(skip(self))]
    async fn reviews(&self) -> Result<Vec<Review>, ApiError> {
        let url = self.http.url("reviews/all")?;
        let page: Option<Page<WireReview>> = self
            .http
            .execute_optional(self.http.request(Method::GET, url))
            .await?;
        Ok(page
            .map(|p| p.content.into_iter().map(convert_review).collect())
            .unwrap_or_default())
    }
}
