//! Bookmark tag colors.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HexColorError {
    /// The value does not start with `#`.
    #[error("color must start with '#'")]
    MissingHash,
    /// The value is not `#RGB` or `#RRGGBB` hex digits.
    #[error("color must be #RGB or #RRGGBB hex, got {0:?}")]
    Invalid(String),
}

/// A CSS-style hex color (`#RGB` or `#RRGGBB`), stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Parse a hex color.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not `#` followed by three or six hex
    /// digits.
    pub fn parse(s: &str) -> Result<Self, HexColorError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or(HexColorError::MissingHash)?;
        if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError::Invalid(s.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    /// Returns the color as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColor {
    type Err = HexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_and_short() {
        assert_eq!(HexColor::parse("#ff0000").unwrap().as_str(), "#FF0000");
        assert_eq!(HexColor::parse("#0af").unwrap().as_str(), "#0AF");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(HexColor::parse("ff0000"), Err(HexColorError::MissingHash));
        assert!(matches!(
            HexColor::parse("#ff00"),
            Err(HexColorError::Invalid(_))
        ));
        assert!(matches!(
            HexColor::parse("#gg0000"),
            Err(HexColorError::Invalid(_))
        ));
    }
}
