//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ClientError` type returned by every store operation.
//! Failures worth investigating are captured to Sentry through
//! [`ClientError::report`] before being handed back to the caller.

use shelfmark_core::{CurrencyError, EmailError, HexColorError, ProductId};
use thiserror::Error;

use crate::api::ApiError;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The operation requires a signed-in user.
    #[error("Not signed in")]
    Unauthenticated,

    /// Input rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The backend answered successfully but without the data we need.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The product is not in the user's inventory.
    #[error("Product {0} is not in the inventory")]
    NotOwned(ProductId),

    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(ProductId),

    /// Some requests of a bulk operation failed. Nothing was rolled back.
    #[error("{failed} of {attempted} requests failed: {first}")]
    PartialFailure {
        failed: usize,
        attempted: usize,
        first: String,
    },

    /// The runtime stopped before a detached operation finished.
    #[error("Operation interrupted")]
    Interrupted,

    /// The cart selection did not match what a single-item removal needs.
    #[error("Expected only product {expected} to be selected, found {selected:?}")]
    InconsistentSelection {
        expected: ProductId,
        selected: Vec<ProductId>,
    },
}

impl ClientError {
    /// User-facing message without internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => match err {
                ApiError::Unauthorized(_) => {
                    "Your session is no longer valid, please sign in again".to_string()
                }
                ApiError::Timeout | ApiError::Http(_) => {
                    "Could not reach the server, check your connection".to_string()
                }
                ApiError::NotFound(_) => "Not found".to_string(),
                ApiError::Status { status, .. } if *status < 500 => {
                    "The request was rejected".to_string()
                }
                _ => "External service error".to_string(),
            },
            Self::Unauthenticated => "Please sign in first".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::InvalidResponse(_) => "Unexpected response from the server".to_string(),
            Self::NotOwned(_) => "This book is not in your library".to_string(),
            Self::ItemNotInCart(_) => "This book is not in your cart".to_string(),
            Self::PartialFailure {
                failed, attempted, ..
            } => format!("{failed} of {attempted} changes could not be saved"),
            Self::Interrupted => "The operation was interrupted, please try again".to_string(),
            Self::InconsistentSelection { .. } => {
                "Your cart changed, please review it and try again".to_string()
            }
        }
    }

    /// Whether this error points at a backend or client defect rather than
    /// user input or connectivity.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(ApiError::Status { status, .. }) => *status >= 500,
            Self::Api(ApiError::Parse(_) | ApiError::Url(_))
            | Self::InvalidResponse(_)
            | Self::InconsistentSelection { .. } => true,
            _ => false,
        }
    }

    /// Capture reportable errors to Sentry and log them. Returns `self` so
    /// it can be used in `map_err`.
    #[must_use]
    pub fn report(self) -> Self {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Store operation failed"
            );
        }
        self
    }
}

impl From<EmailError> for ClientError {
    fn from(err: EmailError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<HexColorError> for ClientError {
    fn from(err: HexColorError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<CurrencyError> for ClientError {
    fn from(err: CurrencyError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias defaulting to `ClientError`.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: Option<&impl ToString>, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: user_id.map(ToString::to_string),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Checked out", Some(&[("items", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::NotOwned(ProductId::new(42));
        assert_eq!(err.to_string(), "Product 42 is not in the inventory");

        let err = ClientError::PartialFailure {
            failed: 1,
            attempted: 3,
            first: "API error: 500 - boom".to_string(),
        };
        assert_eq!(err.to_string(), "1 of 3 requests failed: API error: 500 - boom");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = ClientError::Api(ApiError::Status {
            status: 500,
            message: "NullPointerException at CartService.java:42".to_string(),
        });
        assert_eq!(err.user_message(), "External service error");

        let err = ClientError::Api(ApiError::Unauthorized(401));
        assert!(err.user_message().contains("sign in again"));

        let err = ClientError::InvalidInput("Email must contain '@'".to_string());
        assert_eq!(err.user_message(), "Email must contain '@'");
    }

    #[test]
    fn test_input_errors_convert() {
        let err: ClientError = EmailError::Empty.into();
        assert!(matches!(err, ClientError::InvalidInput(_)));

        let err: ClientError = HexColorError::MissingHash.into();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn test_reportable_classification() {
        assert!(
            ClientError::Api(ApiError::Status {
                status: 502,
                message: String::new()
            })
            .is_reportable()
        );
        assert!(!ClientError::Api(ApiError::Timeout).is_reportable());
        assert!(!ClientError::Unauthenticated.is_reportable());
        assert!(
            ClientError::InconsistentSelection {
                expected: ProductId::new(1),
                selected: vec![]
            }
            .is_reportable()
        );
    }
}
