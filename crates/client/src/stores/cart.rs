//! Cart store: cart contents, selection, purchase history and checkout.
//!
//! The backend owns the cart. Every mutation is followed by a refetch and
//! the published cart is always one the backend reported; totals are never
//! computed locally.

use std::sync::Arc;

use chrono::Utc;
use shelfmark_core::{CurrencyCode, ProductId, UserProfile};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use super::inventory::InventoryStore;
use super::session::SessionStore;
use super::{Confirm, ConfirmAction, settle_all};
use crate::api::{Cart, CartApi, Purchase};
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::storage::{self, Storage, keys};

/// Observable cart state.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    /// `None` until the first fetch.
    pub cart: Option<Cart>,
    pub loading: bool,
    /// Local purchase history, oldest first.
    pub purchases: Vec<Purchase>,
}

/// Result of removing the selected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    NothingSelected,
    Declined,
    /// Number of items the backend removed.
    Removed(usize),
}

/// Result of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The backend had nothing selected to purchase.
    NothingSelected,
    Purchased {
        items: Vec<Purchase>,
        /// `false` when the purchased books could not be added to the
        /// inventory. The cart was still cleared.
        inventory_synced: bool,
    },
}

/// Owns the cart and the purchase history.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: Arc<dyn CartApi>,
    session: SessionStore,
    inventory: InventoryStore,
    storage: Arc<dyn Storage>,
    default_currency: CurrencyCode,
    state: watch::Sender<CartState>,
}

impl CartStore {
    #[must_use]
    pub fn new(
        api: Arc<dyn CartApi>,
        session: SessionStore,
        inventory: InventoryStore,
        storage: Arc<dyn Storage>,
        default_currency: CurrencyCode,
    ) -> Self {
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                inventory,
                storage,
                default_currency,
                state: watch::Sender::new(CartState::default()),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// The last cart the backend reported, if any.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.inner.state.borrow().cart.clone()
    }

    #[must_use]
    pub fn purchases(&self) -> Vec<Purchase> {
        self.inner.state.borrow().purchases.clone()
    }

    fn currency(&self) -> CurrencyCode {
        self.inner.session.currency_or(&self.inner.default_currency)
    }

    fn require_user(&self) -> Result<()> {
        if self.inner.session.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated)
        }
    }

    fn publish(&self, cart: Cart) {
        self.inner.state.send_modify(|state| {
            state.cart = Some(cart);
            state.loading = false;
        });
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Refetch the cart for the signed-in user. Does nothing when signed out.
    pub async fn fetch(&self) {
        if let Some(user) = self.inner.session.user() {
            self.fetch_for(&user).await;
        }
    }

    /// Refetch the cart in `user`'s preferred currency. A backend failure
    /// publishes an empty cart.
    #[instrument(skip(self, user))]
    pub async fn fetch_for(&self, user: &UserProfile) {
        let currency = user
            .preferred_currency
            .clone()
            .unwrap_or_else(|| self.inner.default_currency.clone());

        self.inner.state.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = true;
            !was_loading
        });

        let cart = match self.inner.api.get_cart(&currency).await {
            Ok(cart) => {
                info!(items = cart.items.len(), currency = %currency, "Fetched cart");
                cart
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch cart");
                Cart::empty()
            }
        };
        self.publish(cart);
    }

    /// Forget the cart and the purchase history (sign-out).
    pub fn clear(&self) {
        storage::remove_logged(self.inner.storage.as_ref(), keys::PURCHASES);
        self.inner.state.send_replace(CartState::default());
    }

    /// Load the persisted purchase history. Corrupt or missing history is
    /// treated as empty.
    pub fn restore_purchases(&self) {
        let purchases: Vec<Purchase> =
            storage::load_json(self.inner.storage.as_ref(), keys::PURCHASES).unwrap_or_default();
        self.inner.state.send_modify(|state| {
            state.purchases = purchases;
        });
    }

    // =========================================================================
    // Items & selection
    // =========================================================================

    /// Add a book to the cart. The cart is refetched whether or not the
    /// request succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId) -> Result<()> {
        self.require_user()?;
        let result = self.inner.api.add_item(product_id).await;
        self.fetch().await;
        Ok(result?)
    }

    /// Flip one item's selection.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_selection(&self, product_id: ProductId) -> Result<()> {
        self.require_user()?;
        let result = self
            .inner
            .api
            .toggle_selection(product_id, &self.currency())
            .await;
        self.fetch().await;
        Ok(result?)
    }

    /// Select everything, or deselect everything when all items already are.
    /// Does nothing on an empty or unloaded cart.
    ///
    /// # Errors
    ///
    /// Returns an aggregate error, after the refetch, when any toggle failed.
    #[instrument(skip(self))]
    pub async fn toggle_select_all(&self) -> Result<()> {
        let Some(cart) = self.cart().filter(|c| !c.is_empty()) else {
            return Ok(());
        };
        self.require_user()?;

        let deselect = cart.all_selected();
        let targets: Vec<ProductId> = cart
            .items
            .iter()
            .filter(|item| item.selected == deselect)
            .map(|item| item.product_id)
            .collect();

        let api = &self.inner.api;
        let currency = self.currency();
        let settled = settle_all(
            targets
                .iter()
                .map(|&id| api.toggle_selection(id, &currency)),
        )
        .await;
        self.fetch().await;
        settled.into_result()
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove every selected item after confirmation.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error.
    #[instrument(skip(self, confirm))]
    pub async fn remove_selected(&self, confirm: &dyn Confirm) -> Result<RemoveOutcome> {
        self.require_user()?;
        let count = self.cart().map_or(0, |c| c.selected_items().count());
        if count == 0 {
            return Ok(RemoveOutcome::NothingSelected);
        }
        if !confirm.confirm(&ConfirmAction::RemoveCartItems { count }) {
            return Ok(RemoveOutcome::Declined);
        }

        let result = self.inner.api.delete_selected().await;
        self.fetch().await;
        let removed = result?;
        info!(removed = removed.len(), "Removed selected cart items");
        Ok(RemoveOutcome::Removed(removed.len()))
    }

    /// Remove exactly one item, whatever else is selected.
    ///
    /// The backend can only delete the selection, so this selects the
    /// target, deselects every other selected item, re-reads the cart to
    /// check that only the target is selected, and then deletes. When any
    /// step before the delete fails, the cart the backend reports is
    /// published and nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotInCart` without a request when the item is not in the
    /// loaded cart, `InconsistentSelection` when the re-read shows another
    /// selection, or the backend error of the failed step.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_single_item(&self, product_id: ProductId) -> Result<()> {
        self.require_user()?;
        let cart = self.cart().unwrap_or_default();
        let Some(target) = cart.item(product_id) else {
            return Err(ClientError::ItemNotInCart(product_id));
        };

        let api = &self.inner.api;
        let currency = self.currency();

        if !target.selected {
            if let Err(e) = api.toggle_selection(product_id, &currency).await {
                self.fetch().await;
                return Err(e.into());
            }
        }

        let others: Vec<ProductId> = cart
            .selected_items()
            .map(|item| item.product_id)
            .filter(|&id| id != product_id)
            .collect();
        let settled = settle_all(others.iter().map(|&id| api.toggle_selection(id, &currency))).await;
        if !settled.failures.is_empty() {
            self.fetch().await;
            return settled.into_result();
        }

        let observed = match api.get_cart(&currency).await {
            Ok(cart) => cart,
            Err(e) => {
                self.fetch().await;
                return Err(e.into());
            }
        };
        let selected: Vec<ProductId> = observed.selected_items().map(|i| i.product_id).collect();
        if selected != [product_id] {
            warn!(?selected, "Cart selection changed before single-item removal");
            self.publish(observed);
            return Err(ClientError::InconsistentSelection {
                expected: product_id,
                selected,
            }
            .report());
        }

        let result = api.delete_selected().await;
        self.fetch().await;
        result?;
        info!("Removed cart item");
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Purchase the selected items.
    ///
    /// Purchased items are appended to the history and added to the
    /// inventory, and the cart is reset to empty. When the backend had
    /// nothing selected, nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the backend error of the
    /// checkout itself. A failed inventory update is reported through
    /// [`CheckoutOutcome::Purchased::inventory_synced`].
    #[instrument(skip(self))]
    pub async fn finalize_purchase(&self) -> Result<CheckoutOutcome> {
        self.require_user()?;
        let removed = self.inner.api.delete_selected().await?;
        if removed.is_empty() {
            info!("Nothing selected to purchase");
            return Ok(CheckoutOutcome::NothingSelected);
        }

        let now = Utc::now();
        let items: Vec<Purchase> = removed
            .iter()
            .map(|item| Purchase::from_cart_item(item, now))
            .collect();

        let mut history = self.purchases();
        for purchase in &items {
            if !history.iter().any(|p| p.product_id == purchase.product_id) {
                history.push(purchase.clone());
            }
        }
        storage::save_json(self.inner.storage.as_ref(), keys::PURCHASES, &history);

        let count = items.len().to_string();
        add_breadcrumb("cart", "Checkout completed", Some(&[("items", count.as_str())]));

        let product_ids: Vec<ProductId> = items.iter().map(|p| p.product_id).collect();
        let inventory_synced = match self.inner.inventory.add_products(&product_ids).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to add purchased books to the inventory");
                false
            }
        };

        self.inner.state.send_modify(|state| {
            state.cart = Some(Cart::empty());
            state.loading = false;
            state.purchases = history;
        });
        info!(items = items.len(), "Checkout completed");
        Ok(CheckoutOutcome::Purchased {
            items,
            inventory_synced,
        })
    }
}
