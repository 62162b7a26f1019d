use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment providers an order can be settled with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Paystack,
    Flutterwave,
    Stripe,
    PayPal,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Paystack => "Paystack",
            PaymentMethod::Flutterwave => "Flutterwave",
            PaymentMethod::Stripe => "Stripe",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paystack" => Ok(PaymentMethod::Paystack),
            "Flutterwave" => Ok(PaymentMethod::Flutterwave),
            "Stripe" => Ok(PaymentMethod::Stripe),
            "PayPal" => Ok(PaymentMethod::PayPal),
            "CashOnDelivery" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Hosted checkout handle returned when a transaction is initialised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentInitiation {
    pub redirect_url: String,
    pub reference: String,
    pub access_code: Option<String>,
}

/// The gateway's view of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionVerification {
    pub success: bool,
    pub amount_minor_units: i64,
    pub provider_transaction_id: String,
    pub provider_status: String,
    pub currency: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway unreachable: {0}")]
    Unreachable(String),
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("payment gateway returned an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("payment gateway misconfigured: {0}")]
    Misconfigured(String),
}

/// Adapter over an external payment provider.
///
/// Implementations must bound their network calls with a timeout and must not
/// retry; the order engine surfaces every failure to the caller.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which `PaymentMethod` this gateway settles.
    fn method(&self) -> PaymentMethod;

    /// Start a hosted payment for `amount_minor_units` under `reference`.
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor_units: i64,
        reference: &str,
    ) -> Result<PaymentInitiation, GatewayError>;

    /// Ask the provider what happened to the transaction behind `reference`.
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<TransactionVerification, GatewayError>;
}
