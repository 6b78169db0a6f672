//! Stateful stores observed by the presentation layer.
//!
//! Each store is a cheap cloneable handle (`Arc` inside) owning one
//! top-level collection in a `tokio::sync::watch` channel. Readers call
//! `subscribe()` and see each operation's final state; no intermediate state
//! of a multi-step operation is published.
//!
//! Cross-store effects (checkout refreshing the inventory, bookmark changes
//! refreshing the inventory) are explicit calls across handles.

mod bookmarks;
mod cart;
mod inventory;
mod preferences;
mod session;

pub use bookmarks::{BookmarkStore, DeleteOutcome, diff_assignments};
pub use cart::{CartState, CartStore, CheckoutOutcome, RemoveOutcome};
pub use inventory::InventoryStore;
pub use preferences::{NotificationSettings, PreferencesStore};
pub use session::{ProfileUpdate, Session, SessionStore, UpdateMode};

use std::fmt;
use std::future::Future;

use futures::future::join_all;

use crate::api::ApiError;
use crate::error::ClientError;

// =============================================================================
// Confirmation
// =============================================================================

/// A destructive action awaiting user confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Remove the selected cart items.
    RemoveCartItems { count: usize },
    /// Delete one bookmark, untagging the owned books that carry it.
    DeleteBookmark { books: usize },
    /// Delete bookmarks.
    DeleteBookmarks { count: usize },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveCartItems { count: 1 } => write!(f, "Remove 1 item from the cart?"),
            Self::RemoveCartItems { count } => write!(f, "Remove {count} items from the cart?"),
            Self::DeleteBookmark { books: 0 } => write!(f, "Delete this bookmark?"),
            Self::DeleteBookmark { books: 1 } => {
                write!(f, "Delete this bookmark and remove it from 1 book?")
            }
            Self::DeleteBookmark { books } => {
                write!(f, "Delete this bookmark and remove it from {books} books?")
            }
            Self::DeleteBookmarks { count: 1 } => write!(f, "Delete 1 bookmark?"),
            Self::DeleteBookmarks { count } => write!(f, "Delete {count} bookmarks?"),
        }
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirm: Send + Sync {
    /// Return `true` to proceed.
    fn confirm(&self, action: &ConfirmAction) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&ConfirmAction) -> bool + Send + Sync,
{
    fn confirm(&self, action: &ConfirmAction) -> bool {
        self(action)
    }
}

/// Answers every confirmation the same way (`--yes` flags, tests).
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _action: &ConfirmAction) -> bool {
        self.0
    }
}

// =============================================================================
// Fan-out
// =============================================================================

/// Outcome of a batch of concurrent backend calls.
#[derive(Debug)]
pub(crate) struct Settled {
    pub attempted: usize,
    pub failures: Vec<ApiError>,
}

impl Settled {
    /// `Ok` when every call succeeded, otherwise a single aggregate error.
    pub fn into_result(self) -> Result<(), ClientError> {
        let failed = self.failures.len();
        match self.failures.into_iter().next() {
            None => Ok(()),
            Some(first) if failed == 1 && self.attempted == 1 => Err(first.into()),
            Some(first) => Err(ClientError::PartialFailure {
                failed,
                attempted: self.attempted,
                first: first.to_string(),
            }),
        }
    }
}

/// Run every call concurrently and wait for all of them, successful or not.
pub(crate) async fn settle_all<I, F>(calls: I) -> Settled
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<(), ApiError>>,
{
    let results = join_all(calls).await;
    let attempted = results.len();
    let failures = results.into_iter().filter_map(Result::err).collect();
    Settled {
        attempted,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_settle_all_waits_for_every_call() {
        let calls = (0..4).map(|i| async move {
            if i % 2 == 0 {
                Ok(())
            } else {
                Err(ApiError::Timeout)
            }
        });
        let settled = settle_all(calls).await;
        assert_eq!(settled.attempted, 4);
        assert_eq!(settled.failures.len(), 2);

        match settled.into_result() {
            Err(ClientError::PartialFailure {
                failed, attempted, ..
            }) => {
                assert_eq!(failed, 2);
                assert_eq!(attempted, 4);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_failure_is_not_wrapped() {
        let settled = settle_all([async { Err(ApiError::Timeout) }]).await;
        assert!(matches!(
            settled.into_result(),
            Err(ClientError::Api(ApiError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let settled = settle_all(Vec::<std::future::Ready<Result<(), ApiError>>>::new()).await;
        assert_eq!(settled.attempted, 0);
        assert!(settled.into_result().is_ok());
    }

    #[test]
    fn test_confirm_impls() {
        let action = ConfirmAction::DeleteBookmarks { count: 2 };
        assert!(AutoConfirm(true).confirm(&action));
        assert!(!AutoConfirm(false).confirm(&action));

        let only_small = |a: &ConfirmAction| matches!(a, ConfirmAction::DeleteBookmarks { count } if *count < 3);
        assert!(only_small.confirm(&action));
        assert_eq!(action.to_string(), "Delete 2 bookmarks?");
        assert_eq!(
            ConfirmAction::DeleteBookmark { books: 3 }.to_string(),
            "Delete this bookmark and remove it from 3 books?"
        );
    }
}
