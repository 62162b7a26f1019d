use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use emporium_core::{
    GatewayError, PaymentGateway, PaymentInitiation, PaymentMethod, TransactionVerification,
};

use crate::app_config::PaystackConfig;

/// Paystack wraps every payload in `{status, message, data}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    id: i64,
    status: String,
    amount: i64,
    currency: Option<String>,
    reference: Option<String>,
    gateway_response: Option<String>,
}

pub struct PaystackGateway {
    client: Client,
    base_url: Url,
    secret_key: String,
    callback_url: Option<String>,
    currency: String,
}

impl PaystackGateway {
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        if config.secret_key.trim().is_empty() {
            return Err(GatewayError::Misconfigured("Paystack secret key is empty".into()));
        }

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Misconfigured(format!("invalid Paystack base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Misconfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            secret_key: config.secret_key.clone(),
            callback_url: config.callback_url.clone(),
            currency: config.currency.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Misconfigured("Paystack base URL cannot take a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, GatewayError> {
        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Unreachable(format!("Paystack returned {}", status)));
        }

        // Client errors still carry an envelope explaining the refusal
        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("{} ({})", e, status)))
    }
}

fn unreachable(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Unreachable(format!("request timed out: {}", err))
    } else {
        GatewayError::Unreachable(err.to_string())
    }
}

fn initiation_from(envelope: Envelope<InitializeData>) -> Result<PaymentInitiation, GatewayError> {
    match envelope.data {
        Some(data) if envelope.status => Ok(PaymentInitiation {
            redirect_url: data.authorization_url,
            reference: data.reference,
            access_code: data.access_code,
        }),
        _ => Err(GatewayError::Rejected(format!(
            "Paystack initialization failed: {}",
            envelope.message
        ))),
    }
}

/// Decode a verify response for `reference`. A transaction that answers for
/// another reference, or settled in another currency, is not a success.
fn verification_from(
    envelope: Envelope<VerifyData>,
    reference: &str,
    currency: &str,
) -> TransactionVerification {
    match envelope.data {
        Some(data) if envelope.status => {
            let currency_matches = data
                .currency
                .as_deref()
                .map_or(true, |c| c.eq_ignore_ascii_case(currency));
            let reference_matches = data.reference.as_deref().map_or(true, |r| r == reference);

            let message = if !reference_matches {
                "Transaction reference mismatch".to_string()
            } else if !currency_matches {
                format!("Payment currency mismatch, expected {}", currency)
            } else {
                data.gateway_response.unwrap_or(envelope.message)
            };

            TransactionVerification {
                success: data.status == "success" && reference_matches && currency_matches,
                amount_minor_units: data.amount,
                provider_transaction_id: data.id.to_string(),
                message,
                provider_status: data.status,
                currency: data.currency.unwrap_or_default(),
            }
        }
        _ => TransactionVerification {
            success: false,
            amount_minor_units: 0,
            provider_transaction_id: String::new(),
            provider_status: "unknown".to_string(),
            currency: String::new(),
            message: envelope.message,
        },
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paystack
    }

    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor_units: i64,
        reference: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        let url = self.endpoint(&["transaction", "initialize"])?;
        let body = InitializeRequest {
            email,
            amount: amount_minor_units,
            currency: &self.currency,
            reference,
            callback_url: self.callback_url.as_deref(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(unreachable)?;

        let envelope = Self::read_envelope::<InitializeData>(response).await?;
        let initiation = initiation_from(envelope).map_err(|e| {
            warn!(reference, error = %e, "Paystack refused initialization");
            e
        })?;
        debug!(reference, "Paystack transaction initialized");
        Ok(initiation)
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<TransactionVerification, GatewayError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(unreachable)?;

        let envelope = Self::read_envelope::<VerifyData>(response).await?;
        Ok(verification_from(envelope, reference, &self.currency))
    }
}
