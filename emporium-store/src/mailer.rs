use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use emporium_core::{EmailMessage, NotificationError, Notifier};
use emporium_shared::Masked;

use crate::app_config::MailConfig;

#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Delivers transactional email through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(config: &MailConfig, api_key: impl Into<String>) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotificationError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            from: config.from.clone(),
        })
    }

    fn payload<'a>(&'a self, message: &'a EmailMessage) -> ResendPayload<'a> {
        ResendPayload {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        }
    }
}

#[async_trait]
impl Notifier for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Delivery(format!(
                "mail API returned {}: {}",
                status, body
            )));
        }

        debug!(to = %Masked(message.to.as_str()), subject = %message.subject, "Email accepted");
        Ok(())
    }
}

/// Stand-in used when no mail API key is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        info!(
            to = %Masked(message.to.as_str()),
            subject = %message.subject,
            "Mail delivery disabled, email not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let mailer = ResendMailer::new(&MailConfig::default(), "re_test").unwrap();
        let message = EmailMessage::new("buyer@example.com", "Order received", "<p>Thanks</p>").unwrap();

        let json = serde_json::to_value(mailer.payload(&message)).unwrap();
        assert_eq!(json["from"], "Emporium <noreply@emporium.shop>");
        assert_eq!(json["to"], serde_json::json!(["buyer@example.com"]));
        assert_eq!(json["subject"], "Order received");
        assert_eq!(json["html"], "<p>Thanks</p>");
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let message = EmailMessage::new("buyer@example.com", "Shipped", "<p>On its way</p>").unwrap();
        assert!(LogMailer.send(&message).await.is_ok());
    }
}
