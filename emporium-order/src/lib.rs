pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod repository;
pub mod service;

pub use error::OrderError;
pub use lifecycle::{Effect, LifecycleError, Transition};
pub use memory::InMemoryOrderRepository;
pub use models::{
    AdminOrderView, CreatedOrder, DeliveryDetails, LineItem, NewOrder, Order, OrderStatus,
    OwnerSummary, PaymentResult, ShippingAddress,
};
pub use repository::{OrderRepository, RepoError, RepoResult};
pub use service::{CheckoutSettings, OrderService};
