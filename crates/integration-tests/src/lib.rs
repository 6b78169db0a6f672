//! Integration tests for the Shelfmark client stores.
//!
//! The tests drive a full `AppServices` wired to the in-memory
//! `FakeBackend`, so they exercise cross-store effects (checkout filling the
//! library, bookmark changes reaching owned books) without a server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shelfmark-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `store_properties` - Invariants each store must hold
//! - `shopping_flow` - Sign-in to checkout across every store

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;
use shelfmark_client::AppServices;
use shelfmark_client::testing::{self, FakeBackend, FakeProduct};

/// Email of the account every context signs in with.
pub const EMAIL: &str = "reader@example.com";
/// Password of that account.
pub const PASSWORD: &str = "correct horse";

/// A signed-in client against a seeded fake backend.
pub struct TestContext {
    pub backend: Arc<FakeBackend>,
    pub services: AppServices,
}

impl TestContext {
    /// Backend with a small catalog and a registered reader, not signed in.
    ///
    /// | id | title             | price |
    /// |----|-------------------|-------|
    /// | 1  | Dom Casmurro      | 29.90 |
    /// | 2  | Grande Sertao     | 54.50 |
    /// | 3  | Vidas Secas       | 19.00 |
    /// | 42 | The Hobbit        | 39.90 |
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(FakeBackend::new());
        for product in catalog() {
            backend.add_product(product);
        }
        backend.register_user("Reader", EMAIL, PASSWORD);
        let services = testing::services(&backend);
        Self { backend, services }
    }

    /// Sign in, loading every store.
    ///
    /// # Panics
    ///
    /// Panics if the fake backend rejects the credentials.
    pub async fn signed_in(self) -> Self {
        self.services
            .sign_in(EMAIL, &password())
            .await
            .unwrap_or_else(|e| panic!("sign-in failed: {e}"));
        self
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use]
pub fn password() -> SecretString {
    SecretString::from(PASSWORD.to_string())
}

fn catalog() -> Vec<FakeProduct> {
    vec![
        FakeProduct::new(1, "Dom Casmurro", "Machado de Assis", Decimal::new(2990, 2)).genre(1),
        FakeProduct::new(2, "Grande Sertao", "Guimaraes Rosa", Decimal::new(5450, 2)).genre(1),
        FakeProduct::new(3, "Vidas Secas", "Graciliano Ramos", Decimal::new(1900, 2)),
        FakeProduct::new(42, "The Hobbit", "J. R. R. Tolkien", Decimal::new(3990, 2)).genre(2),
    ]
}
