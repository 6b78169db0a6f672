//! Bookmark store: user-defined colored tags.
//!
//! Every mutation goes to the backend and is followed by a full refetch;
//! nothing is patched locally. Owned books embed their bookmarks, so
//! changes that affect them also refetch the inventory.

use std::sync::Arc;

use shelfmark_core::{BookmarkId, HexColor, ProductId};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use super::inventory::InventoryStore;
use super::session::SessionStore;
use super::{Confirm, ConfirmAction, settle_all};
use crate::api::{Bookmark, BookmarkApi, BookmarkDraft};
use crate::error::{ClientError, Result};

/// Result of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No ids were given.
    NothingToDelete,
    /// The user declined.
    Declined,
    /// Every delete succeeded.
    Deleted(usize),
}

/// Owns the user's bookmarks.
#[derive(Clone)]
pub struct BookmarkStore {
    inner: Arc<BookmarkInner>,
}

struct BookmarkInner {
    api: Arc<dyn BookmarkApi>,
    session: SessionStore,
    inventory: InventoryStore,
    state: watch::Sender<Vec<Bookmark>>,
}

impl BookmarkStore {
    #[must_use]
    pub fn new(api: Arc<dyn BookmarkApi>, session: SessionStore, inventory: InventoryStore) -> Self {
        Self {
            inner: Arc::new(BookmarkInner {
                api,
                session,
                inventory,
                state: watch::Sender::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Bookmark>> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn get(&self, id: BookmarkId) -> Option<Bookmark> {
        self.inner.state.borrow().iter().find(|b| b.id == id).cloned()
    }

    /// Replace the bookmarks with the backend's. Signed out, or on a backend
    /// failure, the list becomes empty.
    #[instrument(skip(self))]
    pub async fn fetch(&self) {
        if !self.inner.session.is_authenticated() {
            self.inner.state.send_replace(Vec::new());
            return;
        }

        match self.inner.api.list_bookmarks().await {
            Ok(bookmarks) => {
                info!(count = bookmarks.len(), "Fetched bookmarks");
                self.inner.state.send_replace(bookmarks);
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch bookmarks");
                self.inner.state.send_replace(Vec::new());
            }
        }
    }

    /// Drop all local state (sign-out).
    pub fn clear(&self) {
        self.inner.state.send_replace(Vec::new());
    }

    fn require_session(&self) -> Result<()> {
        if self.inner.session.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated)
        }
    }

    /// Create a bookmark.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty description or a malformed color,
    /// `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self))]
    pub async fn create(&self, description: &str, hex_color: &str) -> Result<()> {
        self.require_session()?;
        let draft = draft(description, hex_color)?;
        self.inner.api.create_bookmark(&draft).await?;
        self.fetch().await;
        Ok(())
    }

    /// Replace a bookmark's description and color.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    #[instrument(skip(self), fields(bookmark_id = %id))]
    pub async fn update(&self, id: BookmarkId, description: &str, hex_color: &str) -> Result<()> {
        self.require_session()?;
        let draft = draft(description, hex_color)?;
        self.inner.api.update_bookmark(id, &draft).await?;
        self.refresh_all().await;
        Ok(())
    }

    /// Delete one bookmark after confirmation. The backend also removes it
    /// from every book it tags.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self, confirm), fields(bookmark_id = %id))]
    pub async fn delete(&self, id: BookmarkId, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        self.require_session()?;
        let books = self.inner.inventory.tagged_with(id).len();
        if !confirm.confirm(&ConfirmAction::DeleteBookmark { books }) {
            return Ok(DeleteOutcome::Declined);
        }

        self.inner.api.delete_bookmark(id).await?;
        self.refresh_all().await;
        Ok(DeleteOutcome::Deleted(1))
    }

    /// Delete several bookmarks after confirmation. Deletes run
    /// concurrently; the lists are refetched once all have settled.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or an aggregate error when
    /// any delete failed. Successful deletes are not rolled back.
    #[instrument(skip(self, ids, confirm), fields(count = ids.len()))]
    pub async fn delete_many(
        &self,
        ids: &[BookmarkId],
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome> {
        self.require_session()?;
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(DeleteOutcome::NothingToDelete);
        }
        if !confirm.confirm(&ConfirmAction::DeleteBookmarks { count: ids.len() }) {
            return Ok(DeleteOutcome::Declined);
        }

        let api = &self.inner.api;
        let settled = settle_all(ids.iter().map(|&id| api.delete_bookmark(id))).await;
        self.refresh_all().await;

        if !settled.failures.is_empty() {
            warn!(
                failed = settled.failures.len(),
                attempted = settled.attempted,
                "Some bookmark deletes failed"
            );
        }
        settled.into_result()?;
        Ok(DeleteOutcome::Deleted(ids.len()))
    }

    /// Tag one book with `add` and untag it from `remove`. Every change is
    /// its own request; all run concurrently, then the inventory is
    /// refetched.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or an aggregate error when
    /// any request failed. Successful changes are not rolled back.
    #[instrument(skip(self, add, remove), fields(product_id = %product_id))]
    pub async fn assign_to_book(
        &self,
        product_id: ProductId,
        add: &[BookmarkId],
        remove: &[BookmarkId],
    ) -> Result<()> {
        self.require_session()?;
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }

        let api = &self.inner.api;
        let products = [product_id];
        let changes = add
            .iter()
            .map(|&id| (id, true))
            .chain(remove.iter().map(|&id| (id, false)));
        let settled = settle_all(changes.map(|(id, tagging)| async move {
            if tagging {
                api.add_bookmark_to_books(id, &products).await
            } else {
                api.remove_bookmark_from_books(id, &products).await
            }
        }))
        .await;

        self.inner.inventory.fetch().await;
        settled.into_result()
    }

    async fn refresh_all(&self) {
        tokio::join!(self.fetch(), self.inner.inventory.fetch());
    }
}

fn draft(description: &str, hex_color: &str) -> Result<BookmarkDraft> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ClientError::InvalidInput(
            "Bookmark description cannot be empty".to_string(),
        ));
    }
    Ok(BookmarkDraft {
        description: description.to_string(),
        hex_color: HexColor::parse(hex_color)?,
    })
}

/// Split the change from `current` to `desired` bookmarks into the ids to
/// add and the ids to remove.
#[must_use]
pub fn diff_assignments(
    current: &[BookmarkId],
    desired: &[BookmarkId],
) -> (Vec<BookmarkId>, Vec<BookmarkId>) {
    let mut add: Vec<_> = desired
        .iter()
        .filter(|id| !current.contains(id))
        .copied()
        .collect();
    let mut remove: Vec<_> = current
        .iter()
        .filter(|id| !desired.contains(id))
        .copied()
        .collect();
    add.sort_unstable();
    add.dedup();
    remove.sort_unstable();
    remove.dedup();
    (add, remove)
}
