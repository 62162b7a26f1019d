use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub paystack: PaystackConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Without a URL the service keeps orders in memory.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaystackConfig {
    #[serde(default = "default_paystack_url")]
    pub base_url: String,
    pub secret_key: String,
    pub callback_url: Option<String>,
    /// Currency orders are priced in; payments settled in any other are refused.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_mail_url")]
    pub api_url: String,
    /// Without a key, emails are only logged.
    pub api_key: Option<String>,
    #[serde(default = "default_sender")]
    pub from: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: default_mail_url(),
            api_key: None,
            from: default_sender(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub allow_guest: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_timeout_seconds() -> u64 { 10 }
fn default_currency() -> String { "NGN".to_string() }
fn default_paystack_url() -> String { "https://api.paystack.co".to_string() }
fn default_mail_url() -> String { "https://api.resend.com/emails".to_string() }
fn default_sender() -> String { "Emporium <noreply@emporium.shop>".to_string() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `EMPORIUM__PAYSTACK__SECRET_KEY=sk_live_...` sets `paystack.secret_key`
            .add_source(config::Environment::with_prefix("EMPORIUM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = parse(
            r#"
            [server]
            port = 8080
            [auth]
            jwt_secret = "secret"
            [paystack]
            secret_key = "sk_test_123"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.paystack.base_url, "https://api.paystack.co");
        assert_eq!(config.paystack.timeout_seconds, 10);
        assert_eq!(config.paystack.currency, "NGN");
        assert!(config.database.url().is_none());
        assert_eq!(config.database.max_connections, 5);
        assert!(config.mail.api_key.is_none());
        assert!(!config.checkout.allow_guest);
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        let config = parse(
            r#"
            [server]
            port = 8080
            [database]
            url = " "
            [auth]
            jwt_secret = "secret"
            [paystack]
            secret_key = "sk_test_123"
            [checkout]
            allow_guest = true
            "#,
        );

        assert!(config.database.url().is_none());
        assert!(config.checkout.allow_guest);
    }
}
