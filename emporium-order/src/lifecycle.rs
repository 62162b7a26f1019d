use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{DeliveryDetails, Order, OrderStatus};

/// Side effect attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Back to `Processing`: paid, not delivered.
    Reopen,
    /// Hand over to a courier with a fresh tracking number.
    Ship,
    /// Delivered now.
    Deliver,
    /// Stop fulfilment; payment flags stay as they are.
    Cancel,
}

use Effect::*;
use OrderStatus::*;

/// Every permitted `(from, to)` pair. Anything absent is rejected; `Cancelled` is terminal.
const TRANSITIONS: &[(OrderStatus, OrderStatus, Effect)] = &[
    (Processing, Processing, Reopen),
    (Processing, Shipped, Ship),
    (Processing, Delivered, Deliver),
    (Processing, Cancelled, Cancel),
    (Shipped, Processing, Reopen),
    (Shipped, Shipped, Ship),
    (Shipped, Delivered, Deliver),
    (Shipped, Cancelled, Cancel),
    (Delivered, Processing, Reopen),
    (Delivered, Shipped, Ship),
    (Delivered, Delivered, Deliver),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Order cannot move from {from} to {to}")]
pub struct LifecycleError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A looked-up, permitted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub effect: Effect,
}

/// Look up the transition from `from` to `to` in the table.
pub fn plan(from: OrderStatus, to: OrderStatus) -> Result<Transition, LifecycleError> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|&(from, to, effect)| Transition { from, to, effect })
        .ok_or(LifecycleError { from, to })
}

impl Transition {
    /// Move `order` into the target state and apply the side effect.
    pub fn apply(&self, order: &mut Order, now: DateTime<Utc>) {
        order.order_status = self.to;

        match self.effect {
            Reopen => {
                order.assume_paid(now);
                order.clear_delivery();
            }
            Ship => {
                order.assume_paid(now);
                order.clear_delivery();
                order.delivery_details = Some(DeliveryDetails::in_transit(tracking_number()));
            }
            Deliver => {
                order.assume_paid(now);
                order.is_delivered = true;
                order.delivered_at = Some(now);
            }
            Cancel => order.clear_delivery(),
        }

        order.updated_at = now;
    }
}

/// Display-grade tracking identifier; not guaranteed unique.
pub fn tracking_number() -> String {
    format!("TRK-{}", rand::thread_rng().gen_range(0..1_000_000))
}
