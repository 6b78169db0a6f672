//! Invariants the stores hold against the in-memory backend.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use shelfmark_client::ClientError;
use shelfmark_client::stores::{AutoConfirm, CheckoutOutcome, RemoveOutcome};
use shelfmark_client::testing::Op;
use shelfmark_core::{BookmarkId, ProductId};
use shelfmark_integration_tests::TestContext;

fn selected_ids(ctx: &TestContext) -> Vec<i64> {
    ctx.services
        .cart()
        .cart()
        .unwrap()
        .selected_items()
        .map(|i| i.product_id.as_i64())
        .collect()
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_sequential_toggles_match_backend() {
    let ctx = TestContext::new();
    ctx.backend.seed_inventory(42, false);
    let ctx = ctx.signed_in().await;
    let inventory = ctx.services.inventory();

    for _ in 0..5 {
        let flag = inventory.toggle_favorite(ProductId::new(42)).await.unwrap();
        assert_eq!(Some(flag), ctx.backend.is_favorite(42));
        assert_eq!(inventory.is_favorited(ProductId::new(42)), flag);
    }
}

#[tokio::test]
async fn test_toggles_with_failures_still_match_backend() {
    let ctx = TestContext::new();
    ctx.backend.seed_inventory(42, false);
    let ctx = ctx.signed_in().await;
    let inventory = ctx.services.inventory();

    for round in 0..6 {
        if round % 2 == 1 {
            ctx.backend.fail_once(Op::ToggleFavorite);
        }
        let _ = inventory.toggle_favorite(ProductId::new(42)).await;
        assert_eq!(
            Some(inventory.is_favorited(ProductId::new(42))),
            ctx.backend.is_favorite(42)
        );
    }
}

#[tokio::test]
async fn test_concurrent_toggles_serialize_per_product() {
    let ctx = TestContext::new();
    ctx.backend.seed_inventory(42, false);
    let ctx = ctx.signed_in().await;
    let inventory = ctx.services.inventory();

    let (a, b) = tokio::join!(
        inventory.toggle_favorite(ProductId::new(42)),
        inventory.toggle_favorite(ProductId::new(42)),
    );
    assert_ne!(a.unwrap(), b.unwrap());
    assert_eq!(ctx.backend.is_favorite(42), Some(false));
    assert!(!inventory.is_favorited(ProductId::new(42)));
}

#[tokio::test]
async fn test_toggle_unowned_book_makes_no_request() {
    let ctx = TestContext::new().signed_in().await;
    let err = ctx
        .services
        .inventory()
        .toggle_favorite(ProductId::new(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotOwned(_)));
    assert_eq!(ctx.backend.calls(Op::ToggleFavorite), 0);
}

// ============================================================================
// Fetch idempotence
// ============================================================================

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let ctx = TestContext::new();
    ctx.backend.seed_cart(1, true);
    ctx.backend.seed_cart(2, false);
    ctx.backend.seed_inventory(42, true);
    let tag = ctx.backend.seed_bookmark("Fantasy", "#00AA00");
    ctx.backend.tag(42, tag);
    let ctx = ctx.signed_in().await;

    let cart = ctx.services.cart().cart();
    let inventory = ctx.services.inventory().entries();
    let bookmarks = ctx.services.bookmarks().bookmarks();

    for _ in 0..2 {
        ctx.services.cart().fetch().await;
        ctx.services.inventory().fetch().await;
        ctx.services.bookmarks().fetch().await;
    }

    assert_eq!(ctx.services.cart().cart(), cart);
    assert_eq!(ctx.services.inventory().entries(), inventory);
    assert_eq!(ctx.services.bookmarks().bookmarks(), bookmarks);
}

// ============================================================================
// Selection and removal
// ============================================================================

#[tokio::test]
async fn test_remove_single_item_removes_at_most_one() {
    // Every prior selection of a three-item cart
    for mask in 0..8u8 {
        let ctx = TestContext::new();
        for (bit, id) in [1, 2, 3].into_iter().enumerate() {
            ctx.backend.seed_cart(id, mask & (1 << bit) != 0);
        }
        let ctx = ctx.signed_in().await;

        ctx.services
            .cart()
            .remove_single_item(ProductId::new(2))
            .await
            .unwrap();

        let left: Vec<i64> = ctx
            .backend
            .cart_items()
            .iter()
            .map(|i| i.product_id.as_i64())
            .collect();
        assert_eq!(left, vec![1, 3], "prior selection mask {mask:#05b}");
    }
}

#[tokio::test]
async fn test_select_all_flips_both_ways() {
    let ctx = TestContext::new();
    for id in [1, 2, 3] {
        ctx.backend.seed_cart(id, true);
    }
    let ctx = ctx.signed_in().await;
    let cart = ctx.services.cart();

    cart.toggle_select_all().await.unwrap();
    assert!(selected_ids(&ctx).is_empty());

    cart.toggle_select_all().await.unwrap();
    assert_eq!(selected_ids(&ctx), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_remove_selected_leaves_unselected_items() {
    let ctx = TestContext::new();
    ctx.backend.seed_cart(1, false);
    ctx.backend.seed_cart(2, true);
    let ctx = ctx.signed_in().await;

    let outcome = ctx
        .services
        .cart()
        .remove_selected(&AutoConfirm(true))
        .await
        .unwrap();
    assert_eq!(outcome, RemoveOutcome::Removed(1));

    let cart = ctx.services.cart().cart().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, ProductId::new(1));
    assert_eq!(cart.total, Decimal::new(2990, 2));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_finalize_with_nothing_selected_changes_nothing() {
    let ctx = TestContext::new();
    ctx.backend.seed_cart(1, false);
    ctx.backend.seed_inventory(42, false);
    let ctx = ctx.signed_in().await;
    let cart_before = ctx.services.cart().cart();
    let inventory_before = ctx.services.inventory().entries();

    let outcome = ctx.services.cart().finalize_purchase().await.unwrap();
    assert_eq!(outcome, CheckoutOutcome::NothingSelected);
    assert_eq!(ctx.services.cart().cart(), cart_before);
    assert_eq!(ctx.services.inventory().entries(), inventory_before);
    assert_eq!(ctx.backend.calls(Op::AddBooks), 0);
}

// ============================================================================
// Bookmarks
// ============================================================================

#[tokio::test]
async fn test_assign_to_book_adds_and_removes() {
    let ctx = TestContext::new();
    ctx.backend.seed_inventory(42, false);
    let mut ids: Vec<BookmarkId> = Vec::new();
    for n in 1..=7 {
        ids.push(ctx.backend.seed_bookmark(&format!("Tag {n}"), "#123456"));
    }
    let five = ids[4];
    let seven = ids[6];
    ctx.backend.tag(42, seven);
    let ctx = ctx.signed_in().await;

    ctx.services
        .bookmarks()
        .assign_to_book(ProductId::new(42), &[five], &[seven])
        .await
        .unwrap();

    let entry = ctx.services.inventory().get(ProductId::new(42)).unwrap();
    assert!(entry.has_bookmark(five));
    assert!(!entry.has_bookmark(seven));
}
