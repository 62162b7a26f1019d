use std::sync::Arc;

use emporium_order::OrderService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub auth: AuthConfig,
}
