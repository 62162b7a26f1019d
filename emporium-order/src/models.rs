use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use emporium_core::PaymentMethod;
use emporium_shared::to_minor_units;

use crate::error::OrderError;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x300.png?text=No+Image";
pub const DEFAULT_CURRENCY: &str = "NGN";
pub const IN_TRANSIT_COURIER: &str = "In transit";

fn default_image() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// A purchased product line. Immutable once the order exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(alias = "qty")]
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: f64,
    #[serde(default = "default_image")]
    pub image: String,
    pub product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// What the gateway confirmed for a verified payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub provider_id: String,
    pub provider_status: String,
    pub reference: String,
    pub amount: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub courier: String,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl DeliveryDetails {
    pub fn in_transit(tracking_number: String) -> Self {
        Self {
            courier: IN_TRANSIT_COURIER.to_string(),
            tracking_number: Some(tracking_number),
            estimated_delivery: None,
        }
    }
}

/// Checkout request as submitted by a buyer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default, alias = "orderItems")]
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Contact address for guest checkout; ignored for signed-in buyers.
    #[serde(default)]
    pub email: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.line_items.is_empty() {
            return Err(OrderError::Validation("No order items".into()));
        }

        for item in &self.line_items {
            if item.name.trim().is_empty() {
                return Err(OrderError::Validation("Product name is required".into()));
            }
            if item.quantity < 1 {
                return Err(OrderError::Validation(
                    "Quantity cannot be less than 1".into(),
                ));
            }
            if !item.unit_price.is_finite() || item.unit_price < 0.0 {
                return Err(OrderError::Validation("Price cannot be negative".into()));
            }
        }

        let address = &self.shipping_address;
        for (value, label) in [
            (&address.address, "Shipping address"),
            (&address.city, "City"),
            (&address.postal_code, "Postal code"),
            (&address.country, "Country"),
        ] {
            if value.trim().is_empty() {
                return Err(OrderError::Validation(format!("{} is required", label)));
            }
        }

        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(OrderError::Validation(
                "Total price cannot be negative".into(),
            ));
        }

        Ok(())
    }
}

/// The single source of truth for a purchase and its payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: f64,
    pub payment_result: Option<PaymentResult>,
    pub order_status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery_details: Option<DeliveryDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a fresh, unpaid order in `Processing`.
    pub fn place(owner: Option<Uuid>, contact_email: Option<String>, draft: NewOrder) -> Self {
        let now = Utc::now();
        let line_items = draft
            .line_items
            .into_iter()
            .map(|item| LineItem {
                name: item.name.trim().to_string(),
                ..item
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            owner,
            contact_email,
            line_items,
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            total_price: draft.total_price,
            payment_result: None,
            order_status: OrderStatus::Processing,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            delivery_details: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gateway reference for this order.
    pub fn reference(&self) -> String {
        self.id.to_string()
    }

    /// `totalPrice` in gateway minor units.
    pub fn amount_minor_units(&self) -> i64 {
        to_minor_units(self.total_price)
    }

    pub fn is_owned_by(&self, account: Uuid) -> bool {
        self.owner == Some(account)
    }

    /// Attach a verified payment. The caller guarantees none was recorded yet.
    pub fn record_payment(&mut self, result: PaymentResult, paid_at: DateTime<Utc>) {
        self.is_paid = true;
        self.paid_at = Some(paid_at);
        self.payment_result = Some(result);
        self.updated_at = paid_at;
    }

    /// Force the paid flag, keeping `paidAt` consistent with it.
    pub(crate) fn assume_paid(&mut self, now: DateTime<Utc>) {
        self.is_paid = true;
        self.paid_at.get_or_insert(now);
    }

    pub(crate) fn clear_delivery(&mut self) {
        self.is_delivered = false;
        self.delivered_at = None;
    }
}

/// Display subset of the purchasing account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// An order as listed to administrators, with the owner's contact fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub owner_details: Option<OwnerSummary>,
}

/// Result of a successful checkout: where to send the buyer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub order_id: Uuid,
    pub authorization_url: String,
    pub reference: String,
}
