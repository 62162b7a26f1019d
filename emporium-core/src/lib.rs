pub mod identity;
pub mod notification;
pub mod payment;

pub use identity::{authorize, require_role, AccessError, Identity, Operation, Role};
pub use notification::{EmailMessage, NotificationError, Notifier};
pub use payment::{
    GatewayError, PaymentGateway, PaymentInitiation, PaymentMethod, TransactionVerification,
};
