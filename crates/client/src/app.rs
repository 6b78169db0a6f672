//! Service container shared by every screen or command.

use std::sync::Arc;

use secrecy::SecretString;
use shelfmark_core::{CurrencyCode, GenreId, ProductId, UserProfile, UserType};
use tracing::{info, instrument};

use crate::api::{
    ApiError, AuthApi, AuthClient, BookDetail, BookQuery, BookmarkApi, CartApi, CartClient,
    CatalogApi, CatalogBook, CatalogClient, Genre, HttpClient, InventoryApi, InventoryClient,
    Review, ReviewApi, ReviewClient,
};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::storage::{FileStorage, Storage, StorageError};
use crate::stores::{BookmarkStore, CartStore, InventoryStore, PreferencesStore, SessionStore};

/// Error building the services from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("local storage: {0}")]
    Storage(#[from] StorageError),
    #[error("http client: {0}")]
    Http(#[from] ApiError),
}

/// One implementation per backend domain.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthApi>,
    pub cart: Arc<dyn CartApi>,
    pub inventory: Arc<dyn InventoryApi>,
    pub bookmarks: Arc<dyn BookmarkApi>,
    pub catalog: Arc<dyn CatalogApi>,
    pub reviews: Arc<dyn ReviewApi>,
}

impl Backends {
    /// REST adapters for `config`. Reviews get their own client since they
    /// may live on another host.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn http(config: &ClientConfig, storage: &Arc<dyn Storage>) -> Result<Self, ApiError> {
        let api = HttpClient::new(config.api_url.clone(), config.request_timeout, storage.clone())?;
        let reviews = HttpClient::new(
            config.reviews_url.clone(),
            config.request_timeout,
            storage.clone(),
        )?;
        let inventory = Arc::new(InventoryClient::new(api.clone()));

        Ok(Self {
            auth: Arc::new(AuthClient::new(api.clone())),
            cart: Arc::new(CartClient::new(api.clone())),
            inventory: inventory.clone(),
            bookmarks: inventory,
            catalog: Arc::new(CatalogClient::new(api, config.catalog_cache_ttl)),
            reviews: Arc::new(ReviewClient::new(reviews)),
        })
    }
}

/// Every store and adapter, wired together.
///
/// This struct is cheaply cloneable via `Arc`. Build it once at startup
/// and hand out clones.
#[derive(Clone)]
pub struct AppServices {
    inner: Arc<AppServicesInner>,
}

struct AppServicesInner {
    default_currency: CurrencyCode,
    session: SessionStore,
    inventory: InventoryStore,
    bookmarks: BookmarkStore,
    cart: CartStore,
    preferences: PreferencesStore,
    catalog: Arc<dyn CatalogApi>,
    reviews: Arc<dyn ReviewApi>,
}

impl AppServices {
    /// Build the services against the REST backend with file storage in
    /// `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created or an
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, SetupError> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.data_dir)?);
        let backends = Backends::http(config, &storage)?;
        Ok(Self::with_backends(
            backends,
            storage,
            config.default_currency.clone(),
        ))
    }

    /// Build the services on arbitrary backends and storage.
    #[must_use]
    pub fn with_backends(
        backends: Backends,
        storage: Arc<dyn Storage>,
        default_currency: CurrencyCode,
    ) -> Self {
        let session = SessionStore::new(backends.auth, storage.clone());
        let inventory = InventoryStore::new(backends.inventory, session.clone());
        let bookmarks = BookmarkStore::new(backends.bookmarks, session.clone(), inventory.clone());
        let cart = CartStore::new(
            backends.cart,
            session.clone(),
            inventory.clone(),
            storage.clone(),
            default_currency.clone(),
        );
        let preferences = PreferencesStore::new(storage);

        Self {
            inner: Arc::new(AppServicesInner {
                default_currency,
                session,
                inventory,
                bookmarks,
                cart,
                preferences,
                catalog: backends.catalog,
                reviews: backends.reviews,
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn inventory(&self) -> &InventoryStore {
        &self.inner.inventory
    }

    #[must_use]
    pub fn bookmarks(&self) -> &BookmarkStore {
        &self.inner.bookmarks
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn preferences(&self) -> &PreferencesStore {
        &self.inner.preferences
    }

    /// Currency prices are shown in for the current user.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.session.currency_or(&self.inner.default_currency)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore local state and, with a restored session, load the user's
    /// cart, inventory and bookmarks. Returns whether a session was restored.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> bool {
        let restored = self.inner.session.restore();
        self.inner.cart.restore_purchases();
        self.inner.preferences.load();
        if restored {
            self.refresh().await;
        }
        restored
    }

    /// Refetch every user-scoped store concurrently.
    pub async fn refresh(&self) {
        tokio::join!(
            self.inner.cart.fetch(),
            self.inner.inventory.fetch(),
            self.inner.bookmarks.fetch(),
        );
        info!("Stores refreshed");
    }

    /// Sign in and load the user's stores.
    ///
    /// # Errors
    ///
    /// Returns the sign-in error; stores are untouched in that case.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<UserProfile> {
        let user = self.inner.session.sign_in(email, password).await?;
        self.refresh().await;
        Ok(user)
    }

    /// Register, sign in and load the user's stores.
    ///
    /// # Errors
    ///
    /// Returns the registration or sign-in error.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        currency: CurrencyCode,
    ) -> Result<UserProfile> {
        let user = self
            .inner
            .session
            .sign_up(name, email, password, currency, UserType::READER)
            .await?;
        self.refresh().await;
        Ok(user)
    }

    /// Sign out and forget every user-scoped store.
    pub fn sign_out(&self) {
        self.inner.session.sign_out();
        self.inner.cart.clear();
        self.inner.inventory.clear();
        self.inner.bookmarks.clear();
    }

    /// Change the preferred currency and reprice the cart.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    pub async fn set_currency(&self, currency: CurrencyCode) -> Result<()> {
        self.inner.session.update_preferred_currency(currency).await?;
        self.inner.cart.fetch().await;
        Ok(())
    }

    // =========================================================================
    // Catalog & reviews
    // =========================================================================

    /// Search the catalog in the user's currency. Owned books carry their
    /// favorite flag and bookmarks.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn search_books(&self, search: &str, genre: Option<GenreId>) -> Result<Vec<CatalogBook>> {
        let query = BookQuery {
            search: search.trim().to_string(),
            genre,
        };
        let books = self.inner.catalog.search_books(&query, &self.currency()).await?;
        Ok(self.inner.inventory.enrich(&books))
    }

    /// One book in the user's currency.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn book(&self, id: ProductId) -> Result<BookDetail> {
        Ok(self.inner.catalog.book(id, &self.currency()).await?)
    }

    /// Genre tags for filtering searches.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn genres(&self) -> Result<Vec<Genre>> {
        Ok(self.inner.catalog.genres().await?)
    }

    /// Community reviews.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn reviews(&self) -> Result<Vec<Review>> {
        Ok(self.inner.reviews.reviews().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::{self, FakeBackend, FakeProduct, Op};
    use rust_decimal::Decimal;

    fn backend() -> Arc<FakeBackend> {
        let backend = Arc::new(FakeBackend::new());
        backend.add_product(FakeProduct::new(42, "Dune", "Frank Herbert", Decimal::new(3990, 2)));
        backend.add_product(FakeProduct::new(43, "Emma", "Jane Austen", Decimal::new(2500, 2)));
        backend.register_user("Ana", "ana@example.com", "pw");
        backend.seed_inventory(42, true);
        backend.seed_cart(43, true);
        backend.seed_bookmark("Classics", "#FF0000");
        backend
    }

    fn password() -> SecretString {
        SecretString::from("pw".to_string())
    }

    #[tokio::test]
    async fn test_sign_in_refreshes_every_store() {
        let backend = backend();
        let services = testing::services(&backend);

        services.sign_in("ana@example.com", &password()).await.unwrap();
        assert_eq!(services.inventory().entries().len(), 1);
        assert_eq!(services.bookmarks().bookmarks().len(), 1);
        assert_eq!(services.cart().cart().unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_every_store() {
        let backend = backend();
        let services = testing::services(&backend);
        services.sign_in("ana@example.com", &password()).await.unwrap();

        services.sign_out();
        assert!(!services.session().is_authenticated());
        assert!(services.inventory().entries().is_empty());
        assert!(services.bookmarks().bookmarks().is_empty());
        assert!(services.cart().cart().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_restores_and_refreshes() {
        let backend = backend();
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let first = testing::services_with_storage(&backend, storage.clone());
        first.sign_in("ana@example.com", &password()).await.unwrap();

        let second = testing::services_with_storage(&backend, storage);
        assert!(second.bootstrap().await);
        assert!(second.session().is_authenticated());
        assert_eq!(second.inventory().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_without_session_makes_no_requests() {
        let backend = backend();
        let services = testing::services(&backend);

        assert!(!services.bootstrap().await);
        assert_eq!(backend.calls(Op::GetCart), 0);
        assert_eq!(backend.calls(Op::GetInventory), 0);
        assert_eq!(backend.calls(Op::ListBookmarks), 0);
    }

    #[tokio::test]
    async fn test_search_is_enriched_with_inventory() {
        let backend = backend();
        let services = testing::services(&backend);
        services.sign_in("ana@example.com", &password()).await.unwrap();

        let books = services.search_books("", None).await.unwrap();
        assert_eq!(books.len(), 2);
        let dune = books.iter().find(|b| b.id == ProductId::new(42)).unwrap();
        assert!(dune.is_favorite);
        let emma = books.iter().find(|b| b.id == ProductId::new(43)).unwrap();
        assert!(!emma.is_favorite);
        assert_eq!(dune.detail_path, "products/42/BRL");
    }

    #[tokio::test]
    async fn test_set_currency_reprices_cart() {
        let backend = backend();
        let services = testing::services(&backend);
        services.sign_in("ana@example.com", &password()).await.unwrap();
        let fetches = backend.calls(Op::GetCart);

        services
            .set_currency(CurrencyCode::parse("USD").unwrap())
            .await
            .unwrap();
        assert_eq!(services.currency().as_str(), "USD");
        assert_eq!(backend.calls(Op::GetCart), fetches + 1);
    }
}
