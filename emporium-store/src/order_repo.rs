use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::PaymentMethod;
use emporium_order::{
    AdminOrderView, DeliveryDetails, LineItem, Order, OrderRepository, OrderStatus, OwnerSummary,
    PaymentResult, RepoError, RepoResult, ShippingAddress,
};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "o.id, o.owner_id, o.contact_email, o.line_items, o.shipping_address, \
    o.payment_method, o.total_price, o.payment_result, o.order_status, o.is_paid, o.paid_at, \
    o.is_delivered, o.delivered_at, o.delivery_details, o.created_at, o.updated_at";

// Payment state is only ever upgraded here; a payment recorded after the
// caller loaded the order must not be undone by a status write.
const SAVE_ORDER: &str = "UPDATE orders AS o \
    SET order_status = $2, is_paid = o.is_paid OR $3, paid_at = COALESCE(o.paid_at, $4), \
        is_delivered = $5, delivered_at = $6, delivery_details = $7, updated_at = now() \
    WHERE o.id = $1";

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    contact_email: Option<String>,
    line_items: Json<Vec<LineItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    total_price: f64,
    payment_result: Option<Json<PaymentResult>>,
    order_status: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    delivery_details: Option<Json<DeliveryDetails>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AdminOrderRow {
    #[sqlx(flatten)]
    order: OrderRow,
    owner_name: Option<String>,
    owner_email: Option<String>,
    owner_phone: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| RepoError::Corrupt { id: row.id, reason };
        let payment_method: PaymentMethod = row.payment_method.parse().map_err(corrupt)?;
        let order_status: OrderStatus = row.order_status.parse().map_err(corrupt)?;

        Ok(Order {
            id: row.id,
            owner: row.owner_id,
            contact_email: row.contact_email,
            line_items: row.line_items.0,
            shipping_address: row.shipping_address.0,
            payment_method,
            total_price: row.total_price,
            payment_result: row.payment_result.map(|r| r.0),
            order_status,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            delivery_details: row.delivery_details.map(|d| d.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<AdminOrderRow> for AdminOrderView {
    type Error = RepoError;

    fn try_from(row: AdminOrderRow) -> Result<Self, Self::Error> {
        let order = Order::try_from(row.order)?;
        let owner_details = match (order.owner, row.owner_name) {
            (Some(id), Some(name)) => Some(OwnerSummary {
                id,
                name,
                email: row.owner_email.unwrap_or_default(),
                phone_number: row.owner_phone,
            }),
            _ => None,
        };
        Ok(AdminOrderView {
            order,
            owner_details,
        })
    }
}

fn backend(err: sqlx::Error) -> RepoError {
    RepoError::Backend(err.to_string())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, owner_id, contact_email, line_items, shipping_address, payment_method,
                                total_price, payment_result, order_status, is_paid, paid_at, is_delivered,
                                delivered_at, delivery_details, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(order.id)
        .bind(order.owner)
        .bind(order.contact_email.as_deref())
        .bind(Json(&order.line_items))
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.total_price)
        .bind(order.payment_result.as_ref().map(Json))
        .bind(order.order_status.as_str())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.delivery_details.as_ref().map(Json))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders o WHERE o.id = $1", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(Order::try_from).transpose()
    }

    async fn list_all(&self) -> RepoResult<Vec<AdminOrderView>> {
        let rows: Vec<AdminOrderRow> = sqlx::query_as(&format!(
            "SELECT {}, u.name AS owner_name, u.email AS owner_email, u.phone_number AS owner_phone \
             FROM orders o LEFT JOIN users u ON u.id = o.owner_id \
             ORDER BY o.created_at DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(AdminOrderView::try_from).collect()
    }

    async fn list_by_owner(&self, owner: Uuid) -> RepoResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders o WHERE o.owner_id = $1 ORDER BY o.created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn save(&self, order: &Order) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} RETURNING {}", SAVE_ORDER, ORDER_COLUMNS))
                .bind(order.id)
                .bind(order.order_status.as_str())
                .bind(order.is_paid)
                .bind(order.paid_at)
                .bind(order.is_delivered)
                .bind(order.delivered_at)
                .bind(order.delivery_details.as_ref().map(Json))
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(Order::try_from).transpose()
    }

    async fn record_payment(
        &self,
        id: Uuid,
        result: &PaymentResult,
        paid_at: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        // Conditional write: concurrent verifications of one reference record it once
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE orders AS o
            SET is_paid = TRUE, paid_at = $2, payment_result = $3, updated_at = $2
            WHERE o.id = $1 AND o.payment_result IS NULL
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(paid_at)
        .bind(Json(result))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Order::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let outcome = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(outcome.rows_affected() > 0)
    }
}
