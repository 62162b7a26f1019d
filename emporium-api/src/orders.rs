use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_order::{AdminOrderView, NewOrder, Order};

use crate::error::AppError;
use crate::middleware::{CurrentUser, MaybeUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    #[serde(rename = "authorization_url")]
    pub authorization_url: String,
    pub reference: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/paystack/verify/{reference}", get(verify_payment))
        .route("/orders/myorders", get(my_orders))
        .route("/orders/admin", get(all_orders))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/cancel", put(cancel_order))
        .route("/orders/{id}", delete(delete_order))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /orders
async fn create_order(
    State(state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    WithRejection(Json(draft), _): WithRejection<Json<NewOrder>, AppError>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let created = state.orders.create_order(actor.as_ref(), draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: created.order_id,
            authorization_url: created.authorization_url,
            reference: created.reference,
            message: "Payment initialized successfully",
        }),
    ))
}

/// GET /orders/paystack/verify/{reference}
/// Public: the buyer's browser lands here after the hosted payment page.
async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<OrderEnvelope>, AppError> {
    let order = state.orders.verify_payment(&reference).await?;
    Ok(Json(OrderEnvelope {
        message: "Payment successful".to_string(),
        order,
    }))
}

/// GET /orders/myorders
async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_my_orders(&actor).await?))
}

/// GET /orders/admin
async fn all_orders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<AdminOrderView>>, AppError> {
    Ok(Json(state.orders.list_orders(&actor).await?))
}

/// PUT /orders/{id}/status
async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    WithRejection(Path(order_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<StatusUpdateRequest>, AppError>,
) -> Result<Json<OrderEnvelope>, AppError> {
    let order = state
        .orders
        .update_order_status(&actor, order_id, &body.status)
        .await?;

    Ok(Json(OrderEnvelope {
        message: format!("Order updated to {}", order.order_status),
        order,
    }))
}

/// PUT /orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    WithRejection(Path(order_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<OrderEnvelope>, AppError> {
    let order = state.orders.cancel_order(&actor, order_id).await?;
    Ok(Json(OrderEnvelope {
        message: "Order cancelled".to_string(),
        order,
    }))
}

/// DELETE /orders/{id}
async fn delete_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    WithRejection(Path(order_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    state.orders.delete_order(&actor, order_id).await?;
    Ok(Json(MessageResponse {
        message: "Order successfully removed from user history.",
    }))
}
