use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use emporium_order::OrderError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    /// The payment gateway failed; the client may retry.
    UpstreamError(String),
    InternalServerError(String),
}

const GATEWAY_UNAVAILABLE: &str = "Could not connect to the payment gateway";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::UpstreamError(msg) => {
                tracing::error!("Payment gateway failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GATEWAY_UNAVAILABLE.to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Validation(_)
            | OrderError::AmountMismatch { .. }
            | OrderError::PaymentDeclined(_)
            | OrderError::InvalidState(_) => AppError::ValidationError(message),
            OrderError::Unauthenticated | OrderError::NotOwner => {
                AppError::AuthenticationError(message)
            }
            OrderError::Forbidden(_) => AppError::AuthorizationError(message),
            OrderError::NotFound(_) => AppError::NotFoundError(message),
            OrderError::Gateway(e) => AppError::UpstreamError(e.to_string()),
            OrderError::Storage(e) => AppError::InternalServerError(format!("storage: {}", e)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}
