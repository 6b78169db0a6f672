//! Authenticated user profile.
//!
//! Field names on the wire follow the auth backend (`preferedCurrency` is
//! spelled that way by the server). The same JSON shape is what gets
//! persisted locally, so a stored profile can be read back without mapping.

use serde::{Deserialize, Deserializer, Serialize};

use super::currency::CurrencyCode;
use super::id::UserId;

/// Account type sent on registration.
///
/// The backend models it as a plain integer; `1` is a regular reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserType(i32);

impl UserType {
    /// A regular reader account.
    pub const READER: Self = Self(1);
}

impl Default for UserType {
    fn default() -> Self {
        Self::READER
    }
}

/// The signed-in user as returned by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user ID (absent in some auth responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address as stored by the backend.
    #[serde(default)]
    pub email: String,
    /// Currency the user wants prices converted to.
    #[serde(
        rename = "preferedCurrency",
        default,
        deserialize_with = "lenient_currency",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_currency: Option<CurrencyCode>,
    /// Account type.
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

impl UserProfile {
    /// The currency prices should be requested in, falling back to `BRL`.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.preferred_currency.clone().unwrap_or_default()
    }
}

/// Unknown or malformed currency codes from the server are treated as unset
/// rather than failing the whole profile.
fn lenient_currency<'de, D>(deserializer: D) -> Result<Option<CurrencyCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|code| CurrencyCode::parse(&code).ok()))
}
