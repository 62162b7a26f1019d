use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AdminOrderView, Order, PaymentResult};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored order {id} is unreadable: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence for orders. Every method is atomic per order.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> RepoResult<()>;

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>>;

    /// All orders, newest first, joined with owner contact fields.
    async fn list_all(&self) -> RepoResult<Vec<AdminOrderView>>;

    /// Orders belonging to `owner`, newest first.
    async fn list_by_owner(&self, owner: Uuid) -> RepoResult<Vec<Order>>;

    /// Persist lifecycle fields of an existing order; `None` if it vanished.
    async fn save(&self, order: &Order) -> RepoResult<Option<Order>>;

    /// Record a verified payment only if none is recorded yet.
    ///
    /// Returns the updated order, or `None` when the order is missing or
    /// already carries a payment result.
    async fn record_payment(
        &self,
        id: Uuid,
        result: &PaymentResult,
        paid_at: DateTime<Utc>,
    ) -> RepoResult<Option<Order>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}
