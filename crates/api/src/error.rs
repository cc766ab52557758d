//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga or lifecycle error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::ProductNotFound(_) | SagaError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        SagaError::InsufficientStock { .. } | SagaError::InvalidStateTransition { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        SagaError::InventoryUnavailable(_) | SagaError::StoreUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        SagaError::OrderLinesMissing(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        SagaError::CompensationFailed { .. } => {
            // Stock is decremented with no matching order; operators must
            // reconcile by hand. Make sure this is never lost in the logs.
            tracing::error!(error = %err, "compensation failed, manual reconciliation required");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
