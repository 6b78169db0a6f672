//! Sign-in to checkout across every store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use shelfmark_client::ClientError;
use shelfmark_client::storage::{MemoryStorage, Storage};
use shelfmark_client::stores::{AutoConfirm, CheckoutOutcome, DeleteOutcome};
use shelfmark_client::testing::{self, Op};
use shelfmark_core::{CurrencyCode, GenreId, ProductId};
use shelfmark_integration_tests::{EMAIL, TestContext, password};

#[tokio::test]
async fn test_browse_buy_and_organize() {
    let ctx = TestContext::new().signed_in().await;
    let services = &ctx.services;

    // Browse by genre
    let books = services.search_books("", Some(GenreId::new(1))).await.unwrap();
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dom Casmurro", "Grande Sertao"]);

    // Fill the cart and buy one book
    services.cart().add_item(ProductId::new(1)).await.unwrap();
    services.cart().add_item(ProductId::new(42)).await.unwrap();
    services.cart().toggle_selection(ProductId::new(42)).await.unwrap();

    let outcome = services.cart().finalize_purchase().await.unwrap();
    let CheckoutOutcome::Purchased {
        items,
        inventory_synced,
    } = outcome
    else {
        panic!("expected a purchase");
    };
    assert_eq!(items.len(), 1);
    assert!(inventory_synced);
    assert!(services.cart().cart().unwrap().is_empty());
    // Dom Casmurro stays in the backend cart until the next fetch
    services.cart().fetch().await;
    assert_eq!(services.cart().cart().unwrap().items.len(), 1);

    // The purchase is in the library and can be tagged
    assert!(services.inventory().get(ProductId::new(42)).is_some());
    services.bookmarks().create("Fantasy", "#0a0").await.unwrap();
    let fantasy = services.bookmarks().bookmarks()[0].id;
    services
        .bookmarks()
        .assign_to_book(ProductId::new(42), &[fantasy], &[])
        .await
        .unwrap();
    assert_eq!(services.inventory().tagged_with(fantasy).len(), 1);

    // Search results show owned state
    let hobbit = services
        .search_books("hobbit", None)
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    assert_eq!(hobbit.bookmarks.len(), 1);

    // Deleting the bookmark untags the book
    let outcome = services
        .bookmarks()
        .delete_many(&[fantasy], &AutoConfirm(true))
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(1));
    assert!(services.inventory().tagged_with(fantasy).is_empty());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let ctx = TestContext::new();
    ctx.backend.seed_cart(3, true);
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

    let first = testing::services_with_storage(&ctx.backend, storage.clone());
    first.sign_in(EMAIL, &password()).await.unwrap();
    first.preferences().set("reminders", true);

    let second = testing::services_with_storage(&ctx.backend, storage);
    assert!(second.bootstrap().await);
    assert_eq!(second.session().user().unwrap().email, EMAIL);
    assert_eq!(second.cart().cart().unwrap().items.len(), 1);
    assert!(second.preferences().settings().reminders);

    second.sign_out();
    let third = testing::services_with_storage(&ctx.backend, Arc::new(MemoryStorage::new()));
    assert!(!third.bootstrap().await);
}

#[tokio::test]
async fn test_signed_out_mutations_are_rejected() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.bootstrap().await;

    let err = services.cart().add_item(ProductId::new(1)).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));
    let err = services.bookmarks().create("Tag", "#FFF").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));
    let err = services
        .set_currency(CurrencyCode::parse("USD").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));

    assert_eq!(ctx.backend.calls(Op::AddToCart), 0);
    assert_eq!(ctx.backend.calls(Op::CreateBookmark), 0);
}

#[tokio::test]
async fn test_currency_change_reprices_cart() {
    let ctx = TestContext::new();
    ctx.backend.seed_cart(2, false);
    let ctx = ctx.signed_in().await;

    ctx.services
        .set_currency(CurrencyCode::parse("EUR").unwrap())
        .await
        .unwrap();
    assert_eq!(ctx.services.currency().as_str(), "EUR");
    assert_eq!(
        ctx.backend.user(EMAIL).unwrap().currency().as_str(),
        "EUR"
    );
}
