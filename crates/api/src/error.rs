//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error is rendered as a
//! JSON body `{"error": "...", "reason": "..."}`; `reason` is a stable code
//! clients branch on. Server faults are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use markethub_core::CartRuleError;
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// A cart rule rejected the request.
    #[error(transparent)]
    Cart(#[from] CartRuleError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unknown bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: String,
    reason: &'a str,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartRuleError::InvalidQuantity(_)
                | CartRuleError::MissingProductId
                | CartRuleError::AmbiguousLine(_) => StatusCode::BAD_REQUEST,
                CartRuleError::ProductUnavailable(_)
                | CartRuleError::OutOfStock(_)
                | CartRuleError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CartRuleError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable reason code.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Database(_) => "internal",
            Self::Cart(err) => err.reason(),
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let error = match &self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error,
            reason: self.reason(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after a bearer token resolves so errors are associated with the account.
pub fn set_sentry_user(account_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for a cart action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "lamp")]));
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
#[allow(clippy::unwrap_used)]
mod tests {
    use markethub_core::{LineKey, ProductId, QuantityError};

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product lamp".to_string());
        assert_eq!(err.to_string(), "Not found: product lamp");

        let err = AppError::Cart(CartRuleError::MissingProductId);
        assert_eq!(err.to_string(), "missing product id");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        let lamp = ProductId::new("lamp");
        assert_eq!(
            get_status(AppError::Cart(CartRuleError::InvalidQuantity(
                QuantityError::Zero
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cart(CartRuleError::OutOfStock(lamp.clone()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Cart(CartRuleError::InsufficientStock {
                product_id: lamp.clone(),
                requested: 5,
                available: 2,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Cart(CartRuleError::ItemNotFound(LineKey::from(
                &lamp
            )))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "test".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_carries_reason() {
        let response =
            AppError::Cart(CartRuleError::OutOfStock(ProductId::new("lamp"))).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["reason"], "out_of_stock");
        assert_eq!(body["error"], "out of stock: lamp");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response = AppError::Database(RepositoryError::DataCorruption(
            "negative stock".to_string(),
        ))
        .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["reason"], "internal");
    }
}
