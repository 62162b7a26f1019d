pub mod app_config;
pub mod database;
pub mod mailer;
pub mod order_repo;
pub mod paystack;

pub use database::DbClient;
pub use mailer::{LogMailer, ResendMailer};
pub use order_repo::PgOrderRepository;
pub use paystack::PaystackGateway;
