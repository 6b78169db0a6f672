//! Core types for Shelfmark.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod currency;
pub mod email;
pub mod id;
pub mod user;

pub use color::{HexColor, HexColorError};
pub use currency::{CurrencyCode, CurrencyError};
pub use email::{Email, EmailError};
pub use id::*;
pub use user::{UserProfile, UserType};
