use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use emporium_core::{
    authorize, require_role, EmailMessage, Identity, NotificationError, Notifier, Operation,
    PaymentGateway,
};
use emporium_shared::Masked;

use crate::error::OrderError;
use crate::lifecycle;
use crate::models::{
    AdminOrderView, CreatedOrder, NewOrder, Order, OrderStatus, PaymentResult, DEFAULT_CURRENCY,
};
use crate::repository::OrderRepository;

#[derive(Debug, Clone, Default)]
pub struct CheckoutSettings {
    /// Let callers without an identity place orders.
    pub allow_guest_checkout: bool,
}

/// Owns order state transitions, payment reconciliation and their guards.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    settings: CheckoutSettings,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            repo,
            gateway,
            notifier,
            settings,
        }
    }

    /// Persist an unpaid order and open a hosted payment for it.
    ///
    /// If the gateway call fails the order stays stored, unpaid, in
    /// `Processing`; the buyer may retry or abandon it.
    #[instrument(skip(self, actor, draft), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn create_order(
        &self,
        actor: Option<&Identity>,
        draft: NewOrder,
    ) -> Result<CreatedOrder, OrderError> {
        authorize(actor, Operation::CreateOrder, self.settings.allow_guest_checkout)?;
        draft.validate()?;

        if draft.payment_method != self.gateway.method() {
            return Err(OrderError::Validation(format!(
                "Payment method {} is not supported",
                draft.payment_method
            )));
        }

        let email = match actor {
            Some(identity) => identity.email.clone(),
            None => draft
                .email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    OrderError::Validation("An email address is required for guest checkout".into())
                })?,
        };

        // 1. Persist the unpaid order
        let order = Order::place(actor.map(|a| a.id), Some(email.clone()), draft);
        self.repo.insert(&order).await?;
        info!(order_id = %order.id, total_price = order.total_price, "Order created");

        // 2. Open the gateway transaction, keyed by the order id
        let initiation = self
            .gateway
            .initialize_transaction(&email, order.amount_minor_units(), &order.reference())
            .await
            .map_err(|e| {
                warn!(order_id = %order.id, email = %Masked(&email), error = %e, "Payment initialization failed, order left unpaid");
                e
            })?;

        Ok(CreatedOrder {
            order_id: order.id,
            authorization_url: initiation.redirect_url,
            reference: initiation.reference,
        })
    }

    /// Confirm a payment with the gateway and record it on the order.
    ///
    /// Safe to call repeatedly: once a payment is recorded, later calls
    /// return the stored order untouched.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, reference: &str) -> Result<Order, OrderError> {
        authorize(None, Operation::VerifyPayment, false)?;

        let reference = reference.trim();
        if reference.is_empty() {
            return Err(OrderError::Validation("Payment reference is required".into()));
        }

        let verification = self.gateway.verify_transaction(reference).await?;
        if !verification.success {
            warn!(reference, status = %verification.provider_status, "Gateway reports payment not successful");
            return Err(OrderError::PaymentDeclined(verification.message));
        }

        let not_found = || OrderError::NotFound(reference.to_string());
        let order_id = Uuid::parse_str(reference).map_err(|_| not_found())?;
        let order = self.repo.find(order_id).await?.ok_or_else(not_found)?;

        // Reconcile against the locally authoritative total
        let expected = order.amount_minor_units();
        if verification.amount_minor_units != expected {
            warn!(
                %order_id,
                expected,
                confirmed = verification.amount_minor_units,
                "Payment amount mismatch"
            );
            return Err(OrderError::AmountMismatch {
                expected,
                confirmed: verification.amount_minor_units,
            });
        }

        if order.payment_result.is_some() {
            info!(%order_id, "Payment already recorded");
            return Ok(order);
        }

        let currency = if verification.currency.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            verification.currency
        };
        let result = PaymentResult {
            provider_id: verification.provider_transaction_id,
            provider_status: verification.provider_status,
            reference: reference.to_string(),
            amount: Some(order.total_price),
            currency,
        };

        match self.repo.record_payment(order_id, &result, Utc::now()).await? {
            Some(paid) => {
                info!(%order_id, "Order marked as paid");
                self.dispatch(paid.id, payment_receipt(&paid));
                Ok(paid)
            }
            // A concurrent verification recorded it first
            None => self.repo.find(order_id).await?.ok_or_else(not_found),
        }
    }

    /// Admin transition to `Processing`, `Shipped` or `Delivered`.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_order_status(
        &self,
        actor: &Identity,
        order_id: Uuid,
        target: &str,
    ) -> Result<Order, OrderError> {
        require_role(actor, Operation::UpdateOrderStatus)?;
        let order = self.load(order_id).await?;

        let target = match target.parse::<OrderStatus>() {
            Ok(status @ (OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered)) => status,
            _ => return Err(OrderError::Validation("Invalid status update".into())),
        };

        self.transition(order, target).await
    }

    /// Admin cancellation; only orders not yet delivered can be cancelled.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn cancel_order(&self, actor: &Identity, order_id: Uuid) -> Result<Order, OrderError> {
        require_role(actor, Operation::CancelOrder)?;
        let order = self.load(order_id).await?;
        self.transition(order, OrderStatus::Cancelled).await
    }

    /// Owner removes a delivered order from their history.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_order(&self, actor: &Identity, order_id: Uuid) -> Result<(), OrderError> {
        require_role(actor, Operation::DeleteOrder)?;
        let order = self.load(order_id).await?;

        if !order.is_owned_by(actor.id) {
            return Err(OrderError::NotOwner);
        }

        if order.order_status != OrderStatus::Delivered {
            return Err(OrderError::InvalidState(
                "Order cannot be deleted. Only orders with \"Delivered\" status can be removed from history.".into(),
            ));
        }

        if !self.repo.delete(order_id).await? {
            return Err(OrderError::NotFound(order_id.to_string()));
        }

        info!(%order_id, "Order removed from history");
        Ok(())
    }

    pub async fn list_orders(&self, actor: &Identity) -> Result<Vec<AdminOrderView>, OrderError> {
        require_role(actor, Operation::ListAllOrders)?;
        Ok(self.repo.list_all().await?)
    }

    pub async fn list_my_orders(&self, actor: &Identity) -> Result<Vec<Order>, OrderError> {
        require_role(actor, Operation::ListMyOrders)?;
        Ok(self.repo.list_by_owner(actor.id).await?)
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.repo
            .find(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn transition(&self, mut order: Order, target: OrderStatus) -> Result<Order, OrderError> {
        let transition = lifecycle::plan(order.order_status, target)?;
        transition.apply(&mut order, Utc::now());

        let saved = self
            .repo
            .save(&order)
            .await?
            .ok_or_else(|| OrderError::NotFound(order.id.to_string()))?;
        info!(order_id = %saved.id, from = %transition.from, to = %transition.to, "Order status updated");

        if transition.to == OrderStatus::Shipped && transition.from != OrderStatus::Shipped {
            self.dispatch(saved.id, shipment_notice(&saved));
        }

        Ok(saved)
    }

    /// Fire-and-forget delivery; failures are logged only.
    fn dispatch(&self, order_id: Uuid, message: Result<EmailMessage, NotificationError>) {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(%order_id, error = %e, "Notification skipped");
                return;
            }
        };

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                warn!(%order_id, error = %e, "Notification delivery failed");
            }
        });
    }
}

fn payment_receipt(order: &Order) -> Result<EmailMessage, NotificationError> {
    EmailMessage::new(
        order.contact_email.clone().unwrap_or_default(),
        "Payment received",
        format!(
            "<p>We received your payment of {:.2} for order <strong>{}</strong>.</p>\
             <p>We will let you know as soon as it ships.</p>",
            order.total_price, order.id
        ),
    )
}

fn shipment_notice(order: &Order) -> Result<EmailMessage, NotificationError> {
    let tracking = order
        .delivery_details
        .as_ref()
        .and_then(|d| d.tracking_number.as_deref())
        .unwrap_or("pending");
    EmailMessage::new(
        order.contact_email.clone().unwrap_or_default(),
        "Your order has shipped",
        format!(
            "<p>Order <strong>{}</strong> is on its way.</p><p>Tracking number: {}</p>",
            order.id, tracking
        ),
    )
}
