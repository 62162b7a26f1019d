#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use emporium_api::{app, middleware::Claims, AppState, AuthConfig};
use emporium_core::{
    GatewayError, PaymentGateway, PaymentInitiation, PaymentMethod, Role, TransactionVerification,
};
use emporium_order::{CheckoutSettings, InMemoryOrderRepository, OrderService};
use emporium_store::LogMailer;

pub const SECRET: &str = "integration-secret";

/// Paystack stand-in: confirms whatever amount was initialized unless told otherwise.
#[derive(Default)]
pub struct ScriptedGateway {
    initialized: Mutex<HashMap<String, i64>>,
    confirm_amount: Mutex<Option<i64>>,
    decline: Mutex<bool>,
}

impl ScriptedGateway {
    pub fn confirm_amount(&self, amount: i64) {
        *self.confirm_amount.lock().unwrap() = Some(amount);
    }

    pub fn decline(&self) {
        *self.decline.lock().unwrap() = true;
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paystack
    }

    async fn initialize_transaction(
        &self,
        _email: &str,
        amount_minor_units: i64,
        reference: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        self.initialized
            .lock()
            .unwrap()
            .insert(reference.to_string(), amount_minor_units);
        Ok(PaymentInitiation {
            redirect_url: format!("https://checkout.paystack.test/{}", reference),
            reference: reference.to_string(),
            access_code: Some("acc_123".into()),
        })
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<TransactionVerification, GatewayError> {
        let requested = self.initialized.lock().unwrap().get(reference).copied();
        let Some(requested) = requested else {
            return Ok(TransactionVerification {
                success: false,
                amount_minor_units: 0,
                provider_transaction_id: String::new(),
                provider_status: "unknown".into(),
                currency: String::new(),
                message: "Transaction reference not found".into(),
            });
        };
        let declined = *self.decline.lock().unwrap();
        Ok(TransactionVerification {
            success: !declined,
            amount_minor_units: self.confirm_amount.lock().unwrap().unwrap_or(requested),
            provider_transaction_id: "4099260516".into(),
            provider_status: if declined { "failed".into() } else { "success".into() },
            currency: "NGN".into(),
            message: if declined { "Declined".into() } else { "Approved".into() },
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryOrderRepository>,
    pub gateway: Arc<ScriptedGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_guest_checkout(false)
    }

    pub fn with_guest_checkout(allow_guest_checkout: bool) -> Self {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let gateway = Arc::new(ScriptedGateway::default());
        let orders = OrderService::new(
            repo.clone(),
            gateway.clone(),
            Arc::new(LogMailer),
            CheckoutSettings { allow_guest_checkout },
        );
        let state = AppState {
            orders: Arc::new(orders),
            auth: AuthConfig {
                secret: SECRET.to_string(),
            },
        };
        Self {
            router: app(state),
            repo,
            gateway,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub struct Account {
    pub id: Uuid,
    pub token: String,
}

pub fn account(role: Role) -> Account {
    let id = Uuid::new_v4();
    let claims = Claims {
        sub: id,
        email: format!("{}@example.com", role),
        name: Some("Test Account".into()),
        role,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    Account { id, token }
}

pub fn checkout_body(total_price: f64) -> Value {
    serde_json::json!({
        "orderItems": [
            { "name": "Adire Tote", "qty": 2, "price": 25.0, "product": "prod-1" }
        ],
        "shippingAddress": {
            "address": "12 Marina Rd",
            "city": "Lagos",
            "postalCode": "101241",
            "country": "Nigeria"
        },
        "totalPrice": total_price,
        "paymentMethod": "Paystack"
    })
}
