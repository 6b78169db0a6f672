//! Catalog backend adapter (`/products/*`).
//!
//! Book details, genre tags and the unfiltered listing are cached using
//! `moka`. Searches with a query or genre filter always hit the backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Method;
use shelfmark_core::{CurrencyCode, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{
    ListOrPage, Page, WireBookDetail, WireGenre, WireProduct, convert_book_detail,
    convert_genres, convert_product, detail_path,
};
use super::http::HttpClient;
use super::types::{BookDetail, BookQuery, CatalogBook, Genre};
use super::{ApiError, CatalogApi};

/// Client for the public book catalog.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    http: HttpClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client whose cached entries live for `cache_ttl`.
    #[must_use]
    pub fn new(http: HttpClient, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner { http, cache }),
        }
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    #[instrument(skip(self), fields(search = %query.search, currency = %currency))]
    async fn search_books(
        &self,
        query: &BookQuery,
        currency: &CurrencyCode,
    ) -> Result<Vec<CatalogBook>, ApiError> {
        let cache_key = CacheKey::Listing {
            currency: currency.clone(),
        };

        // Check cache (only for the unfiltered listing)
        if query.is_listing()
            && let Some(CacheValue::Listing(books)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for catalog listing");
            return Ok(books);
        }

        let http = &self.inner.http;
        let mut url = http.url(&format!("products/{currency}"))?;
        url.query_pairs_mut()
            .append_pair("search", query.search.trim())
            .append_pair(
                "genreTag",
                &query.genre.map(|g| g.to_string()).unwrap_or_default(),
            );

        let page: Option<Page<WireProduct>> = http
            .execute_optional(http.request(Method::GET, url))
            .await?;
        let books: Vec<CatalogBook> = page
            .map(|p| p.content)
            .unwrap_or_default()
            .into_iter()
            .map(|product| convert_product(product, currency))
            .collect();

        if query.is_listing() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Listing(books.clone()))
                .await;
        }

        Ok(books)
    }

    #[instrument(skip(self), fields(product_id = %id, currency = %currency))]
    async fn book(&self, id: ProductId, currency: &CurrencyCode) -> Result<BookDetail, ApiError> {
        let cache_key = CacheKey::Book {
            id,
            currency: currency.clone(),
        };

        if let Some(CacheValue::Book(book)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for book");
            return Ok(*book);
        }

        let http = &self.inner.http;
        let url = http.url(&detail_path(id, currency))?;
        let wire: WireBookDetail = http.execute(http.request(Method::GET, url)).await?;
        let book = convert_book_detail(wire);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Book(Box::new(book.clone())))
            .await;

        Ok(book)
    }

    #[instrument(skip(self))]
    async fn genres(&self) -> Result<Vec<Genre>, ApiError> {
        if let Some(CacheValue::Genres(genres)) = self.inner.cache.get(&CacheKey::Genres).await {
            debug!("Cache hit for genres");
            return Ok(genres);
        }

        let http = &self.inner.http;
        let url = http.url("products/tags")?;
        let wire: Option<ListOrPage<WireGenre>> = http
            .execute_optional(http.request(Method::GET, url))
            .await?;
        let genres = wire.map(convert_genres).unwrap_or_default();

        self.inner
            .cache
            .insert(CacheKey::Genres, CacheValue::Genres(genres.clone()))
            .await;

        Ok(genres)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use shelfmark_core::GenreId;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use super::*;
    use crate::storage::MemoryStorage;

    /// Local backend answering catalog routes and recording request targets.
    struct Backend {
        base: Url,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl Backend {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let seen = requests.clone();

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = socket.read(&mut chunk).await.unwrap();
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&chunk[..n]);
                    }
                    let head = String::from_utf8_lossy(&head);
                    let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                    let body = respond(&target);
                    seen.lock().unwrap().push(target);

                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                }
            });

            Self {
                base: Url::parse(&format!("http://{addr}/")).unwrap(),
                requests,
            }
        }

        fn client(&self) -> CatalogClient {
            let http = HttpClient::new(
                self.base.clone(),
                Duration::from_secs(5),
                Arc::new(MemoryStorage::new()),
            )
            .unwrap();
            CatalogClient::new(http, Duration::from_secs(60))
        }

        fn hits(&self, prefix: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.starts_with(prefix))
                .count()
        }
    }

    fn respond(target: &str) -> &'static str {
        let path = target.split('?').next().unwrap_or_default();
        if path.ends_with("/tags") {
            r#"[{"tagId": 1, "name": "Fantasy"}]"#
        } else if path.matches('/').count() == 3 {
            r#"{"id": 42, "title": "Dune", "author": "Frank Herbert"}"#
        } else {
            r#"{"content": [{"id": 42, "title": "Dune", "author": "Frank Herbert"}]}"#
        }
    }

    fn currency(code: &str) -> CurrencyCode {
        CurrencyCode::parse(code).unwrap()
    }

    fn query(search: &str, genre: Option<i64>) -> BookQuery {
        BookQuery {
            search: search.to_string(),
            genre: genre.map(GenreId::new),
        }
    }

    #[tokio::test]
    async fn test_listing_cached_per_currency() {
        let backend = Backend::start().await;
        let catalog = backend.client();

        let first = catalog.search_books(&query("", None), &currency("BRL")).await.unwrap();
        let second = catalog.search_books(&query("  ", None), &currency("BRL")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.hits("/products/BRL"), 1);

        let usd = catalog.search_books(&query("", None), &currency("USD")).await.unwrap();
        assert_eq!(usd[0].detail_path, "products/42/USD");
        assert_eq!(backend.hits("/products/USD"), 1);
    }

    #[tokio::test]
    async fn test_filtered_searches_are_not_cached() {
        let backend = Backend::start().await;
        let catalog = backend.client();
        let brl = currency("BRL");

        for _ in 0..2 {
            catalog.search_books(&query("dune", None), &brl).await.unwrap();
            catalog.search_books(&query("", Some(1)), &brl).await.unwrap();
        }
        assert_eq!(backend.hits("/products/BRL?"), 4);

        // A filtered search does not fill the listing entry either
        catalog.search_books(&query("", None), &brl).await.unwrap();
        assert_eq!(backend.hits("/products/BRL?"), 5);
    }

    #[tokio::test]
    async fn test_book_cached_per_id_and_currency() {
        let backend = Backend::start().await;
        let catalog = backend.client();
        let id = ProductId::new(42);

        let book = catalog.book(id, &currency("BRL")).await.unwrap();
        assert_eq!(book.title, "Dune");
        catalog.book(id, &currency("BRL")).await.unwrap();
        assert_eq!(backend.hits("/products/42/BRL"), 1);

        catalog.book(id, &currency("EUR")).await.unwrap();
        assert_eq!(backend.hits("/products/42/EUR"), 1);
    }

    #[tokio::test]
    async fn test_genres_cached() {
        let backend = Backend::start().await;
        let catalog = backend.client();

        let genres = catalog.genres().await.unwrap();
        assert_eq!(genres.len(), 1);
        catalog.genres().await.unwrap();
        assert_eq!(backend.hits("/products/tags"), 1);
    }
}
