//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for callers driving the storefront
//! (the CLI, tests). Server-side failures are captured to Sentry by
//! [`AppError::report`]; user mistakes are not.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use shopfront_core::{EmailError, PriceError, ValidationError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Content-store API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Placing an order failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart input was rejected.
    #[error("Invalid cart input: {0}")]
    Validation(#[from] ValidationError),

    /// A price could not be parsed.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// An email address could not be parsed.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Writing command output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error was caused by the user's input rather than a failing
    /// system.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Price(_) | Self::Email(_) | Self::BadRequest(_) => true,
            Self::Api(err) => err.is_client_error(),
            Self::Checkout(err) => err.is_user_error(),
            Self::Config(_) | Self::Output(_) => false,
        }
    }

    /// Log the error and, for system failures, capture it to Sentry.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::warn!(error = %self, "Request rejected");
        } else {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Does not expose upstream response bodies.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) if !err.is_client_error() => {
                "The store is unavailable right now, please try again".to_string()
            }
            Self::Checkout(CheckoutError::Submission(_)) => {
                "Failed to submit order. Your cart has been kept, please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
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
