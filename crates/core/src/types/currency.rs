//! ISO 4217 currency codes.
//!
//! Prices are converted by the backend; the client only ever names the
//! currency it wants prices in. Codes are kept open-ended (any three ASCII
//! letters) so a currency added server-side does not break deserialization of
//! a stored profile.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not exactly three ASCII letters.
    #[error("currency code must be three ASCII letters, got {0:?}")]
    Invalid(String),
}

/// An upper-case ISO 4217 currency code such as `BRL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Brazilian real. Used when a profile has no preferred currency.
    pub const BRL: &'static str = "BRL";
    /// US dollar.
    pub const USD: &'static str = "USD";
    /// Euro.
    pub const EUR: &'static str = "EUR";

    /// Currencies offered on the settings screen, with display names.
    pub const SUPPORTED: [(&'static str, &'static str); 3] = [
        (Self::BRL, "Brazilian real"),
        (Self::USD, "US dollar"),
        (Self::EUR, "Euro"),
    ];

    /// Parse a currency code, normalizing it to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Invalid`] unless the trimmed input is exactly
    /// three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(CurrencyError::Invalid(s.to_string()))
        }
    }

    /// The fallback currency (`BRL`).
    #[must_use]
    pub fn fallback() -> Self {
        Self(Self::BRL.to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the [`CurrencyCode::SUPPORTED`] currencies.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.iter().any(|(code, _)| *code == self.0)
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uppercases() {
        assert_eq!(CurrencyCode::parse("usd").unwrap().as_str(), "USD");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("US1").is_err());
        assert!(CurrencyCode::parse("DOLLAR").is_err());
    }

    #[test]
    fn test_fallback_is_brl() {
        assert_eq!(CurrencyCode::default().as_str(), "BRL");
        assert!(CurrencyCode::default().is_supported());
    }

    #[test]
    fn test_unsupported_but_valid() {
        let gbp = CurrencyCode::parse("GBP").unwrap();
        assert!(!gbp.is_supported());
    }
}
