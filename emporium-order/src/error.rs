use emporium_core::{AccessError, GatewayError};

use crate::lifecycle::LifecycleError;
use crate::repository::RepoError;

/// Failures of the order lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("Not authorized, no token provided")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Not authorized to delete this order. Access denied.")]
    NotOwner,

    #[error("Order not found")]
    NotFound(String),

    #[error("Payment verification failed: amount mismatch")]
    AmountMismatch { expected: i64, confirmed: i64 },

    #[error("Payment failed: {0}")]
    PaymentDeclined(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Storage(#[from] RepoError),
}

impl From<AccessError> for OrderError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => OrderError::Unauthenticated,
            forbidden @ AccessError::Forbidden { .. } => OrderError::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<LifecycleError> for OrderError {
    fn from(err: LifecycleError) -> Self {
        OrderError::InvalidState(err.to_string())
    }
}
