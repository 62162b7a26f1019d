use async_trait::async_trait;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Recipient email is undefined")]
    MissingRecipient,
    #[error("Email subject is undefined")]
    MissingSubject,
    #[error("Email content is undefined")]
    MissingContent,
    #[error("Failed to send email: {0}")]
    Delivery(String),
}

/// A fully addressed email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let (to, subject, html) = (to.into(), subject.into(), html.into());
        if to.trim().is_empty() {
            return Err(NotificationError::MissingRecipient);
        }
        if subject.trim().is_empty() {
            return Err(NotificationError::MissingSubject);
        }
        if html.trim().is_empty() {
            return Err(NotificationError::MissingContent);
        }
        Ok(Self { to, subject, html })
    }
}

/// Outbound message delivery. Callers treat delivery as fire-and-forget.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_requires_every_part() {
        assert_eq!(
            EmailMessage::new(" ", "Receipt", "<p>hi</p>"),
            Err(NotificationError::MissingRecipient)
        );
        assert_eq!(
            EmailMessage::new("a@b.co", "", "<p>hi</p>"),
            Err(NotificationError::MissingSubject)
        );
        assert_eq!(
            EmailMessage::new("a@b.co", "Receipt", ""),
            Err(NotificationError::MissingContent)
        );
        assert!(EmailMessage::new("a@b.co", "Receipt", "<p>hi</p>").is_ok());
    }
}
