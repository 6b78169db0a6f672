//! Shelfmark client library.
//!
//! The client-side state layer of the Shelfmark book store: HTTP adapters for
//! the backend services and the stores that cache session, cart, inventory,
//! bookmark and preference state for a presentation layer.
//!
//! # Layers
//!
//! - [`api`] - One adapter per backend domain, each behind a trait
//! - [`storage`] - Key/value local storage for the session and small caches
//! - [`stores`] - Stateful services observed through `watch` receivers
//! - [`app`] - The container wiring adapters and stores together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod storage;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use app::AppServices;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
