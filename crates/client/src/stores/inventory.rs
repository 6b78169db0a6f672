//! Inventory store: owned books, favorites and bookmark associations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use shelfmark_core::{BookmarkId, ProductId};
use tokio::sync::watch;
use tracing::{Instrument, error, info, instrument};

use super::session::SessionStore;
use crate::api::{CatalogBook, InventoryApi, InventoryEntry};
use crate::error::{ClientError, Result};

type ToggleGuards = Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>;

/// Owns the user's inventory.
#[derive(Clone)]
pub struct InventoryStore {
    inner: Arc<InventoryInner>,
}

struct InventoryInner {
    api: Arc<dyn InventoryApi>,
    session: SessionStore,
    state: watch::Sender<Vec<InventoryEntry>>,
    toggles: ToggleGuards,
}

impl InventoryStore {
    #[must_use]
    pub fn new(api: Arc<dyn InventoryApi>, session: SessionStore) -> Self {
        Self {
            inner: Arc::new(InventoryInner {
                api,
                session,
                state: watch::Sender::new(Vec::new()),
                toggles: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Watch inventory changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<InventoryEntry>> {
        self.inner.state.subscribe()
    }

    /// Every owned book.
    #[must_use]
    pub fn entries(&self) -> Vec<InventoryEntry> {
        self.inner.state.borrow().clone()
    }

    /// One owned book.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<InventoryEntry> {
        self.inner
            .state
            .borrow()
            .iter()
            .find(|e| e.product_id == product_id)
            .cloned()
    }

    /// Replace the inventory with the backend's. Signed out, or on a backend
    /// failure, the inventory becomes empty.
    #[instrument(skip(self))]
    pub async fn fetch(&self) {
        if !self.inner.session.is_authenticated() {
            self.inner.state.send_replace(Vec::new());
            return;
        }

        match self.inner.api.get_inventory().await {
            Ok(entries) => {
                info!(count = entries.len(), "Fetched inventory");
                self.inner.state.send_replace(entries);
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch inventory");
                self.inner.state.send_replace(Vec::new());
            }
        }
    }

    /// Drop all local state (sign-out).
    pub fn clear(&self) {
        self.inner.state.send_replace(Vec::new());
    }

    /// Whether an owned book is a favorite. `false` for books not owned.
    #[must_use]
    pub fn is_favorited(&self, product_id: ProductId) -> bool {
        self.inner
            .state
            .borrow()
            .iter()
            .any(|e| e.product_id == product_id && e.is_favorite)
    }

    /// Flip the favorite flag of an owned book and return the new value.
    ///
    /// The flag flips locally before the request. Toggles of the same book
    /// run one at a time. On failure the flag is reverted unless something
    /// else (a refetch) has replaced it meanwhile.
    ///
    /// The toggle runs on its own task: dropping the returned future leaves
    /// it to settle, reverting the flag if the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns `NotOwned` without a request for books not in the inventory,
    /// `Interrupted` if the runtime shuts down first, or the backend error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_favorite(&self, product_id: ProductId) -> Result<bool> {
        let store = self.clone();
        let task = tokio::spawn(
            async move {
                let lock = store.toggle_guard(product_id);
                let result = {
                    let _in_flight = lock.lock().await;
                    store.toggle_favorite_locked(product_id).await
                };
                store.release_toggle_guard(product_id, &lock);
                result
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ClientError::Interrupted),
        }
    }

    async fn toggle_favorite_locked(&self, product_id: ProductId) -> Result<bool> {
        let mut previous = None;
        self.inner.state.send_if_modified(|entries| {
            match entries.iter_mut().find(|e| e.product_id == product_id) {
                Some(entry) => {
                    previous = Some(entry.is_favorite);
                    entry.is_favorite = !entry.is_favorite;
                    true
                }
                None => false,
            }
        });

        let Some(previous) = previous else {
            return Err(ClientError::NotOwned(product_id));
        };
        let optimistic = !previous;

        match self.inner.api.toggle_favorite(product_id).await {
            Ok(()) => Ok(optimistic),
            Err(e) => {
                self.inner.state.send_if_modified(|entries| {
                    revert_if_unchanged(entries, product_id, optimistic, previous)
                });
                Err(e.into())
            }
        }
    }

    fn toggle_guard(&self, product_id: ProductId) -> Arc<tokio::sync::Mutex<()>> {
        self.inner
            .toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(product_id)
            .or_default()
            .clone()
    }

    fn release_toggle_guard(&self, product_id: ProductId, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut toggles = self
            .inner
            .toggles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map and this caller hold it: nobody is waiting
        if Arc::strong_count(lock) <= 2 {
            toggles.remove(&product_id);
        }
    }

    /// Copy `books`, merging owned state onto the ones in the inventory.
    #[must_use]
    pub fn enrich(&self, books: &[CatalogBook]) -> Vec<CatalogBook> {
        let entries = self.inner.state.borrow();
        books
            .iter()
            .map(|book| {
                let mut book = book.clone();
                if let Some(entry) = entries.iter().find(|e| e.product_id == book.id) {
                    book.is_favorite = entry.is_favorite;
                    book.bookmarks.clone_from(&entry.bookmarks);
                    if book.image_url.trim().is_empty()
                        && let Some(image) = &entry.image_url
                    {
                        book.image_url.clone_from(image);
                    }
                }
                book
            })
            .collect()
    }

    /// Add books to the inventory, then refetch it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self), fields(count = product_ids.len()))]
    pub async fn add_products(&self, product_ids: &[ProductId]) -> Result<()> {
        if !self.inner.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        if product_ids.is_empty() {
            return Ok(());
        }
        self.inner.api.add_books(product_ids).await?;
        self.fetch().await;
        Ok(())
    }

    /// Owned books whose title contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<InventoryEntry> {
        let needle = query.trim().to_lowercase();
        self.inner
            .state
            .borrow()
            .iter()
            .filter(|e| needle.is_empty() || e.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<InventoryEntry> {
        self.inner
            .state
            .borrow()
            .iter()
            .filter(|e| e.is_favorite)
            .cloned()
            .collect()
    }

    /// Owned books carrying a bookmark.
    #[must_use]
    pub fn tagged_with(&self, bookmark_id: BookmarkId) -> Vec<InventoryEntry> {
        self.inner
            .state
            .borrow()
            .iter()
            .filter(|e| e.has_bookmark(bookmark_id))
            .cloned()
            .collect()
    }
}

/// Put back `previous` if the entry still holds the `optimistic` value.
/// Returns whether anything changed.
fn revert_if_unchanged(
    entries: &mut [InventoryEntry],
    product_id: ProductId,
    optimistic: bool,
    previous: bool,
) -> bool {
    match entries.iter_mut().find(|e| e.product_id == product_id) {
        Some(entry) if entry.is_favorite == optimistic => {
            entry.is_favorite = previous;
            true
        }
        _ => false,
    }
}
