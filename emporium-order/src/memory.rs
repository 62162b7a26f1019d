use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AdminOrderView, Order, OwnerSummary, PaymentResult};
use crate::repository::{OrderRepository, RepoResult};

/// Process-local order store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    owners: RwLock<HashMap<Uuid, OwnerSummary>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an account's contact fields available to the admin listing.
    pub async fn register_owner(&self, owner: OwnerSummary) {
        self.owners.write().await.insert(owner.id, owner);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> RepoResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_all(&self) -> RepoResult<Vec<AdminOrderView>> {
        let orders = self.orders.read().await;
        let owners = self.owners.read().await;

        let mut views: Vec<AdminOrderView> = orders
            .values()
            .map(|order| AdminOrderView {
                owner_details: order.owner.and_then(|id| owners.get(&id).cloned()),
                order: order.clone(),
            })
            .collect();
        newest_first(&mut views, |view| view.order.created_at);
        Ok(views)
    }

    async fn list_by_owner(&self, owner: Uuid) -> RepoResult<Vec<Order>> {
        let mut mine: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.is_owned_by(owner))
            .cloned()
            .collect();
        newest_first(&mut mine, |order| order.created_at);
        Ok(mine)
    }

    async fn save(&self, order: &Order) -> RepoResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored) => {
                // A payment recorded since `order` was loaded must survive the write
                let payment_result = stored.payment_result.take().or_else(|| order.payment_result.clone());
                let paid_at = stored.paid_at.or(order.paid_at);
                let is_paid = stored.is_paid || order.is_paid;

                *stored = order.clone();
                stored.payment_result = payment_result;
                stored.paid_at = paid_at;
                stored.is_paid = is_paid;
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn record_payment(
        &self,
        id: Uuid,
        result: &PaymentResult,
        paid_at: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(stored) if stored.payment_result.is_none() => {
                stored.record_payment(result.clone(), paid_at);
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, NewOrder, OrderStatus, ShippingAddress};
    use emporium_core::PaymentMethod;

    fn order() -> Order {
        Order::place(
            Some(Uuid::new_v4()),
            Some("buyer@example.com".into()),
            NewOrder {
                line_items: vec![LineItem {
                    name: "Kente Scarf".into(),
                    quantity: 1,
                    unit_price: 30.0,
                    image: "img".into(),
                    product: "p-3".into(),
                }],
                shipping_address: ShippingAddress {
                    address: "4 Ring Rd".into(),
                    city: "Ibadan".into(),
                    postal_code: "200001".into(),
                    country: "Nigeria".into(),
                },
                total_price: 30.0,
                payment_method: PaymentMethod::Paystack,
                email: None,
            },
        )
    }

    fn payment(reference: &str) -> PaymentResult {
        PaymentResult {
            provider_id: "4099260516".into(),
            provider_status: "success".into(),
            reference: reference.to_string(),
            amount: Some(30.0),
            currency: "NGN".into(),
        }
    }

    #[tokio::test]
    async fn test_record_payment_only_once() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        repo.insert(&order).await.unwrap();

        let first = Utc::now();
        assert!(repo.record_payment(order.id, &payment("a"), first).await.unwrap().is_some());
        assert!(repo.record_payment(order.id, &payment("b"), Utc::now()).await.unwrap().is_none());

        let stored = repo.find(order.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_at, Some(first));
        assert_eq!(stored.payment_result.unwrap().reference, "a");
    }

    #[tokio::test]
    async fn test_stale_save_keeps_recorded_payment() {
        let repo = InMemoryOrderRepository::new();
        let mut stale = order();
        repo.insert(&stale).await.unwrap();

        let paid_at = Utc::now();
        repo.record_payment(stale.id, &payment(&stale.reference()), paid_at)
            .await
            .unwrap();

        stale.order_status = OrderStatus::Cancelled;
        let saved = repo.save(&stale).await.unwrap().unwrap();

        assert_eq!(saved.order_status, OrderStatus::Cancelled);
        assert!(saved.is_paid);
        assert_eq!(saved.paid_at, Some(paid_at));
        assert!(saved.payment_result.is_some());
    }
}
