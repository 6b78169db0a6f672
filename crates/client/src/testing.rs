//! In-memory backend and storage for driving the stores in tests.
//!
//! Available with the `test-utils` feature.
//!
//! [`FakeBackend`] implements every backend trait against a single in-memory
//! state that mimics the real services closely enough for store tests: the
//! cart total is computed server-side, bookmarks are embedded in inventory
//! entries, checkout deletes the selected items. Failures can be injected
//! per operation (and optionally per id), and hooks can mutate the state
//! after a call to simulate another device.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = Arc::new(FakeBackend::new());
//! backend.add_product(FakeProduct::new(1, "Dune", "Frank Herbert", Decimal::new(3990, 2)));
//! backend.register_user("Ana", "ana@example.com", "secret");
//! backend.fail_once(Op::ToggleFavorite);
//!
//! let services = testing::services(&backend);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use shelfmark_core::{
    BookmarkId, CurrencyCode, Email, GenreId, ProductId, UserId, UserProfile, UserType,
};

use crate::api::{
    ApiError, AuthApi, AuthSession, BookDetail, BookQuery, Bookmark, BookmarkApi, BookmarkDraft,
    Cart, CartApi, CartItem, CatalogApi, CatalogBook, Genre, InventoryApi, InventoryEntry,
    Review, ReviewApi, ReviewedBook, SignUpRequest, UserUpdate,
};
use crate::app::{AppServices, Backends};
use crate::storage::{Storage, StorageError};

pub use crate::storage::MemoryStorage;

/// Backend operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SignUp,
    SignIn,
    UpdateUser,
    GetCart,
    AddToCart,
    ToggleSelection,
    DeleteSelected,
    GetInventory,
    AddBooks,
    ToggleFavorite,
    ListBookmarks,
    CreateBookmark,
    UpdateBookmark,
    DeleteBookmark,
    AddBookmarkToBooks,
    RemoveBookmarkFromBooks,
    SearchBooks,
    Book,
    Genres,
    Reviews,
}

/// A catalog product known to the fake backend.
#[derive(Debug, Clone)]
pub struct FakeProduct {
    pub id: ProductId,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub genre: Option<GenreId>,
}

impl FakeProduct {
    #[must_use]
    pub fn new(id: i64, title: &str, author: &str, price: Decimal) -> Self {
        Self {
            id: ProductId::new(id),
            title: title.to_string(),
            author: author.to_string(),
            price,
            image_url: Some(format!("https://img.example/{id}.jpg")),
            genre: None,
        }
    }

    #[must_use]
    pub const fn genre(mut self, genre: i64) -> Self {
        self.genre = Some(GenreId::new(genre));
        self
    }

    #[must_use]
    pub fn without_image(mut self) -> Self {
        self.image_url = None;
        self
    }
}

#[derive(Debug, Clone)]
struct FailRule {
    op: Op,
    key: Option<i64>,
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct FakeUser {
    password: String,
    profile: UserProfile,
}

#[derive(Debug, Default)]
struct FakeState {
    users: HashMap<String, FakeUser>,
    signed_in: Option<String>,
    omit_token: bool,
    next_token: u64,
    next_user_id: i64,
    products: Vec<FakeProduct>,
    cart: Vec<CartItem>,
    inventory: Vec<InventoryEntry>,
    bookmarks: Vec<Bookmark>,
    next_bookmark_id: i64,
    genres: Vec<Genre>,
    reviews: Vec<Review>,
    rules: Vec<FailRule>,
    calls: HashMap<Op, usize>,
}

type Hook = Arc<dyn Fn(&FakeBackend) + Send + Sync>;

/// In-memory implementation of every backend trait.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    hooks: Mutex<HashMap<Op, Hook>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub fn add_product(&self, product: FakeProduct) {
        self.lock().products.push(product);
    }

    /// Register an account that can sign in.
    pub fn register_user(&self, name: &str, email: &str, password: &str) -> UserProfile {
        let mut state = self.lock();
        state.next_user_id += 1;
        let profile = UserProfile {
            id: Some(UserId::new(state.next_user_id)),
            name: name.to_string(),
            email: email.to_lowercase(),
            preferred_currency: Some(CurrencyCode::fallback()),
            user_type: Some(UserType::READER),
        };
        state.users.insert(
            email.to_lowercase(),
            FakeUser {
                password: password.to_string(),
                profile: profile.clone(),
            },
        );
        profile
    }

    /// Put a catalog product in the cart.
    pub fn seed_cart(&self, product_id: i64, selected: bool) {
        let mut state = self.lock();
        if let Some(mut item) = cart_item_for(&state, ProductId::new(product_id)) {
            item.selected = selected;
            state.cart.push(item);
        }
    }

    /// Put a catalog product in the inventory.
    pub fn seed_inventory(&self, product_id: i64, favorite: bool) {
        let mut state = self.lock();
        if let Some(mut entry) = inventory_entry_for(&state, ProductId::new(product_id)) {
            entry.is_favorite = favorite;
            state.inventory.push(entry);
        }
    }

    pub fn seed_bookmark(&self, description: &str, hex_color: &str) -> BookmarkId {
        let mut state = self.lock();
        state.next_bookmark_id += 1;
        let id = BookmarkId::new(state.next_bookmark_id);
        state.bookmarks.push(Bookmark {
            id,
            description: description.to_string(),
            hex_color: hex_color.to_string(),
        });
        id
    }

    /// Tag an owned book with a bookmark.
    pub fn tag(&self, product_id: i64, bookmark: BookmarkId) {
        let mut state = self.lock();
        tag_books(&mut state, bookmark, &[ProductId::new(product_id)]);
    }

    pub fn add_genre(&self, id: i64, name: &str) {
        self.lock().genres.push(Genre {
            id: GenreId::new(id),
            name: name.to_string(),
        });
    }

    pub fn add_review(&self, username: &str, post_date: &str, grade: f64, book_title: &str) {
        self.lock().reviews.push(Review {
            id: format!("{username}-{post_date}"),
            username: username.to_string(),
            post_date: post_date.to_string(),
            grade: Some(grade),
            title: format!("Review of {book_title}"),
            comment: String::new(),
            book: ReviewedBook {
                title: book_title.to_string(),
                image_url: None,
            },
        });
    }

    /// Make sign-in answer without a token.
    pub fn omit_token_on_sign_in(&self, omit: bool) {
        self.lock().omit_token = omit;
    }

    // =========================================================================
    // Failure injection & hooks
    // =========================================================================

    /// Fail every call of `op`.
    pub fn fail(&self, op: Op) {
        self.push_rule(op, None, None);
    }

    /// Fail the next call of `op`.
    pub fn fail_once(&self, op: Op) {
        self.push_rule(op, None, Some(1));
    }

    /// Fail every call of `op` addressing `id` (product or bookmark id).
    pub fn fail_for(&self, op: Op, id: i64) {
        self.push_rule(op, Some(id), None);
    }

    /// Remove every injected failure.
    pub fn heal(&self) {
        self.lock().rules.clear();
    }

    fn push_rule(&self, op: Op, key: Option<i64>, remaining: Option<usize>) {
        self.lock().rules.push(FailRule { op, key, remaining });
    }

    /// Run `hook` after every successful call of `op`.
    pub fn on_call(&self, op: Op, hook: impl Fn(&Self) + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op, Arc::new(hook));
    }

    fn run_hook(&self, op: Op) {
        let hook = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&op)
            .cloned();
        if let Some(hook) = hook {
            hook(self);
        }
    }

    /// Record a call and apply any matching failure rule.
    async fn enter(&self, op: Op, key: Option<i64>) -> Result<(), ApiError> {
        // Let concurrent callers interleave like real requests would
        tokio::task::yield_now().await;

        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;

        let hit = state
            .rules
            .iter()
            .position(|r| r.op == op && (r.key.is_none() || r.key == key));
        let Some(index) = hit else {
            return Ok(());
        };

        let exhausted = match state.rules.get_mut(index).and_then(|r| r.remaining.as_mut()) {
            Some(remaining) => {
                *remaining -= 1;
                *remaining == 0
            }
            None => false,
        };
        if exhausted {
            state.rules.remove(index);
        }

        Err(ApiError::Status {
            status: 503,
            message: format!("injected failure for {op:?}"),
        })
    }

    fn finish<T>(&self, op: Op, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if result.is_ok() {
            self.run_hook(op);
        }
        result
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// How many times `op` was called (including failed calls).
    #[must_use]
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.lock().cart.clone()
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<ProductId> {
        self.lock()
            .cart
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.product_id)
            .collect()
    }

    /// Set a cart item's selection directly, as another device would.
    pub fn set_selected(&self, product_id: i64, selected: bool) {
        let mut state = self.lock();
        if let Some(item) = state
            .cart
            .iter_mut()
            .find(|i| i.product_id == ProductId::new(product_id))
        {
            item.selected = selected;
        }
    }

    #[must_use]
    pub fn inventory(&self) -> Vec<InventoryEntry> {
        self.lock().inventory.clone()
    }

    #[must_use]
    pub fn is_favorite(&self, product_id: i64) -> Option<bool> {
        self.lock()
            .inventory
            .iter()
            .find(|e| e.product_id == ProductId::new(product_id))
            .map(|e| e.is_favorite)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.lock().bookmarks.clone()
    }

    /// The stored profile of a registered user.
    #[must_use]
    pub fn user(&self, email: &str) -> Option<UserProfile> {
        self.lock()
            .users
            .get(&email.to_lowercase())
            .map(|u| u.profile.clone())
    }
}

fn not_found(what: impl std::fmt::Display) -> ApiError {
    ApiError::NotFound(what.to_string())
}

fn product(state: &FakeState, id: ProductId) -> Option<&FakeProduct> {
    state.products.iter().find(|p| p.id == id)
}

fn cart_item_for(state: &FakeState, id: ProductId) -> Option<CartItem> {
    product(state, id).map(|p| CartItem {
        product_id: p.id,
        title: p.title.clone(),
        author: p.author.clone(),
        image_url: p.image_url.clone(),
        converted_price: p.price,
        selected: false,
    })
}

fn inventory_entry_for(state: &FakeState, id: ProductId) -> Option<InventoryEntry> {
    product(state, id).map(|p| InventoryEntry {
        product_id: p.id,
        title: p.title.clone(),
        author: p.author.clone(),
        image_url: p.image_url.clone(),
        is_favorite: false,
        bookmarks: Vec::new(),
    })
}

fn catalog_book(p: &FakeProduct, currency: &CurrencyCode) -> CatalogBook {
    CatalogBook {
        id: p.id,
        title: p.title.clone(),
        author: p.author.clone(),
        image_url: p.image_url.clone().unwrap_or_default(),
        price: Some(p.price),
        detail_path: format!("products/{}/{currency}", p.id),
        is_favorite: false,
        bookmarks: Vec::new(),
    }
}

fn tag_books(state: &mut FakeState, bookmark: BookmarkId, ids: &[ProductId]) {
    let Some(tag) = state.bookmarks.iter().find(|b| b.id == bookmark).cloned() else {
        return;
    };
    for entry in state
        .inventory
        .iter_mut()
        .filter(|e| ids.contains(&e.product_id))
    {
        if !entry.has_bookmark(bookmark) {
            entry.bookmarks.push(tag.clone());
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        self.enter(Op::SignUp, None).await?;
        let result = {
            let mut state = self.lock();
            if state.users.contains_key(request.email.as_str()) {
                Err(ApiError::Status {
                    status: 409,
                    message: "email already registered".to_string(),
                })
            } else {
                state.next_user_id += 1;
                let profile = UserProfile {
                    id: Some(UserId::new(state.next_user_id)),
                    name: request.name.to_lowercase(),
                    email: request.email.to_string(),
                    preferred_currency: Some(request.preferred_currency.clone()),
                    user_type: Some(request.user_type),
                };
                state.users.insert(
                    request.email.to_string(),
                    FakeUser {
                        password: request.password.expose_secret().to_string(),
                        profile,
                    },
                );
                Ok(())
            }
        };
        self.finish(Op::SignUp, result)
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, ApiError> {
        self.enter(Op::SignIn, None).await?;
        let result = {
            let mut state = self.lock();
            let profile = state
                .users
                .get(email.as_str())
                .filter(|u| u.password == password.expose_secret())
                .map(|u| u.profile.clone());
            match profile {
                Some(profile) => {
                    state.signed_in = Some(email.to_string());
                    state.next_token += 1;
                    let token = (!state.omit_token).then(|| format!("token-{}", state.next_token));
                    Ok(AuthSession {
                        user: Some(profile),
                        token,
                    })
                }
                None => Err(ApiError::Unauthorized(401)),
            }
        };
        self.finish(Op::SignIn, result)
    }

    async fn update_user(&self, update: &UserUpdate) -> Result<AuthSession, ApiError> {
        self.enter(Op::UpdateUser, None).await?;
        let result = {
            let mut state = self.lock();
            let email = state.signed_in.clone().unwrap_or_default();
            match state.users.get_mut(&email) {
                Some(user) => {
                    if let Some(name) = &update.name {
                        user.profile.name.clone_from(name);
                    }
                    if let Some(email) = &update.email {
                        user.profile.email = email.to_string();
                    }
                    if let Some(currency) = &update.preferred_currency {
                        user.profile.preferred_currency = Some(currency.clone());
                    }
                    Ok(AuthSession {
                        user: Some(user.profile.clone()),
                        token: None,
                    })
                }
                None => Err(ApiError::Unauthorized(401)),
            }
        };
        self.finish(Op::UpdateUser, result)
    }
}

#[async_trait]
impl CartApi for FakeBackend {
    async fn get_cart(&self, _currency: &CurrencyCode) -> Result<Cart, ApiError> {
        self.enter(Op::GetCart, None).await?;
        let cart = {
            let state = self.lock();
            Cart {
                items: state.cart.clone(),
                total: state.cart.iter().map(|i| i.converted_price).sum(),
            }
        };
        self.finish(Op::GetCart, Ok(cart))
    }

    async fn add_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.enter(Op::AddToCart, Some(product_id.as_i64())).await?;
        let result = {
            let mut state = self.lock();
            if state.cart.iter().any(|i| i.product_id == product_id) {
                Ok(())
            } else {
                match cart_item_for(&state, product_id) {
                    Some(item) => {
                        state.cart.push(item);
                        Ok(())
                    }
                    None => Err(not_found(format!("product {product_id}"))),
                }
            }
        };
        self.finish(Op::AddToCart, result)
    }

    async fn toggle_selection(
        &self,
        product_id: ProductId,
        _currency: &CurrencyCode,
    ) -> Result<(), ApiError> {
        self.enter(Op::ToggleSelection, Some(product_id.as_i64()))
            .await?;
        let result = {
            let mut state = self.lock();
            match state.cart.iter_mut().find(|i| i.product_id == product_id) {
                Some(item) => {
                    item.selected = !item.selected;
                    Ok(())
                }
                None => Err(not_found(format!("cart item {product_id}"))),
            }
        };
        self.finish(Op::ToggleSelection, result)
    }

    async fn delete_selected(&self) -> Result<Vec<CartItem>, ApiError> {
        self.enter(Op::DeleteSelected, None).await?;
        let removed = {
            let mut state = self.lock();
            let (removed, kept): (Vec<_>, Vec<_>) =
                state.cart.drain(..).partition(|i| i.selected);
            state.cart = kept;
            removed
        };
        self.finish(Op::DeleteSelected, Ok(removed))
    }
}

#[async_trait]
impl InventoryApi for FakeBackend {
    async fn get_inventory(&self) -> Result<Vec<InventoryEntry>, ApiError> {
        self.enter(Op::GetInventory, None).await?;
        let inventory = self.lock().inventory.clone();
        self.finish(Op::GetInventory, Ok(inventory))
    }

    async fn add_books(&self, product_ids: &[ProductId]) -> Result<(), ApiError> {
        self.enter(Op::AddBooks, None).await?;
        {
            let mut state = self.lock();
            for &id in product_ids {
                if state.inventory.iter().any(|e| e.product_id == id) {
                    continue;
                }
                if let Some(entry) = inventory_entry_for(&state, id) {
                    state.inventory.push(entry);
                }
            }
        }
        self.finish(Op::AddBooks, Ok(()))
    }

    async fn toggle_favorite(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.enter(Op::ToggleFavorite, Some(product_id.as_i64()))
            .await?;
        let result = {
            let mut state = self.lock();
            match state
                .inventory
                .iter_mut()
                .find(|e| e.product_id == product_id)
            {
                Some(entry) => {
                    entry.is_favorite = !entry.is_favorite;
                    Ok(())
                }
                None => Err(not_found(format!("inventory item {product_id}"))),
            }
        };
        self.finish(Op::ToggleFavorite, result)
    }
}

#[async_trait]
impl BookmarkApi for FakeBackend {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError> {
        self.enter(Op::ListBookmarks, None).await?;
        let bookmarks = self.lock().bookmarks.clone();
        self.finish(Op::ListBookmarks, Ok(bookmarks))
    }

    async fn create_bookmark(&self, draft: &BookmarkDraft) -> Result<(), ApiError> {
        self.enter(Op::CreateBookmark, None).await?;
        {
            let mut state = self.lock();
            state.next_bookmark_id += 1;
            let id = BookmarkId::new(state.next_bookmark_id);
            state.bookmarks.push(Bookmark {
                id,
                description: draft.description.clone(),
                hex_color: draft.hex_color.to_string(),
            });
        }
        self.finish(Op::CreateBookmark, Ok(()))
    }

    async fn update_bookmark(
        &self,
        id: BookmarkId,
        draft: &BookmarkDraft,
    ) -> Result<(), ApiError> {
        self.enter(Op::UpdateBookmark, Some(id.as_i64())).await?;
        let result = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let updated = Bookmark {
                id,
                description: draft.description.clone(),
                hex_color: draft.hex_color.to_string(),
            };
            match state.bookmarks.iter_mut().find(|b| b.id == id) {
                Some(bookmark) => {
                    *bookmark = updated.clone();
                    for tag in state
                        .inventory
                        .iter_mut()
                        .flat_map(|e| e.bookmarks.iter_mut())
                        .filter(|b| b.id == id)
                    {
                        *tag = updated.clone();
                    }
                    Ok(())
                }
                None => Err(not_found(format!("bookmark {id}"))),
            }
        };
        self.finish(Op::UpdateBookmark, result)
    }

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), ApiError> {
        self.enter(Op::DeleteBookmark, Some(id.as_i64())).await?;
        let result = {
            let mut state = self.lock();
            let before = state.bookmarks.len();
            state.bookmarks.retain(|b| b.id != id);
            if state.bookmarks.len() == before {
                Err(not_found(format!("bookmark {id}")))
            } else {
                for entry in &mut state.inventory {
                    entry.bookmarks.retain(|b| b.id != id);
                }
                Ok(())
            }
        };
        self.finish(Op::DeleteBookmark, result)
    }

    async fn add_bookmark_to_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError> {
        self.enter(Op::AddBookmarkToBooks, Some(id.as_i64())).await?;
        let result = {
            let mut state = self.lock();
            if state.bookmarks.iter().any(|b| b.id == id) {
                tag_books(&mut state, id, product_ids);
                Ok(())
            } else {
                Err(not_found(format!("bookmark {id}")))
            }
        };
        self.finish(Op::AddBookmarkToBooks, result)
    }

    async fn remove_bookmark_from_books(
        &self,
        id: BookmarkId,
        product_ids: &[ProductId],
    ) -> Result<(), ApiError> {
        self.enter(Op::RemoveBookmarkFromBooks, Some(id.as_i64()))
            .await?;
        {
            let mut state = self.lock();
            for entry in state
                .inventory
                .iter_mut()
                .filter(|e| product_ids.contains(&e.product_id))
            {
                entry.bookmarks.retain(|b| b.id != id);
            }
        }
        self.finish(Op::RemoveBookmarkFromBooks, Ok(()))
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    async fn search_books(
        &self,
        query: &BookQuery,
        currency: &CurrencyCode,
    ) -> Result<Vec<CatalogBook>, ApiError> {
        self.enter(Op::SearchBooks, None).await?;
        let needle = query.search.trim().to_lowercase();
        let books = self
            .lock()
            .products
            .iter()
            .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .filter(|p| query.genre.is_none() || p.genre == query.genre)
            .map(|p| catalog_book(p, currency))
            .collect();
        self.finish(Op::SearchBooks, Ok(books))
    }

    async fn book(&self, id: ProductId, _currency: &CurrencyCode) -> Result<BookDetail, ApiError> {
        self.enter(Op::Book, Some(id.as_i64())).await?;
        let result = product(&self.lock(), id)
            .map(|p| BookDetail {
                id: p.id,
                title: p.title.clone(),
                author: p.author.clone(),
                image_url: p.image_url.clone().unwrap_or_default(),
                price: Some(p.price),
                attributes: serde_json::Map::new(),
            })
            .ok_or_else(|| not_found(format!("product {id}")));
        self.finish(Op::Book, result)
    }

    async fn genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.enter(Op::Genres, None).await?;
        let genres = self.lock().genres.clone();
        self.finish(Op::Genres, Ok(genres))
    }
}

#[async_trait]
impl ReviewApi for FakeBackend {
    async fn reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.enter(Op::Reviews, None).await?;
        let reviews = self.lock().reviews.clone();
        self.finish(Op::Reviews, Ok(reviews))
    }
}

// =============================================================================
// Wiring helpers
// =============================================================================

/// Every backend trait served by the same fake.
#[must_use]
pub fn backends(fake: &Arc<FakeBackend>) -> Backends {
    Backends {
        auth: fake.clone(),
        cart: fake.clone(),
        inventory: fake.clone(),
        bookmarks: fake.clone(),
        catalog: fake.clone(),
        reviews: fake.clone(),
    }
}

/// Services wired to `fake` with in-memory storage.
#[must_use]
pub fn services(fake: &Arc<FakeBackend>) -> AppServices {
    services_with_storage(fake, Arc::new(MemoryStorage::new()))
}

/// Services wired to `fake` with the given storage.
#[must_use]
pub fn services_with_storage(fake: &Arc<FakeBackend>, storage: Arc<dyn Storage>) -> AppServices {
    AppServices::with_backends(backends(fake), storage, CurrencyCode::fallback())
}

/// Storage whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStorage;

impl Storage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("failing storage".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("failing storage".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("failing storage".to_string()))
    }
}
