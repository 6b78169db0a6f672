//! Shelfmark Core - Shared domain types.
//!
//! This crate provides the types shared by every Shelfmark component:
//! - `client` - Stores and HTTP adapters for the book store backend
//! - `cli` - Command-line front end driving the stores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, currencies, colors and user profiles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
