use core_config::nats::NatsConfig;
use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use domain_notifications::{SmtpConfig, DEFAULT_STORE_CAPACITY};
use messaging::DEFAULT_SUBSCRIPTION_BUFFER;

/// Everything the notifier reads from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifierConfig {
    pub nats: NatsConfig,
    pub smtp: SmtpConfig,
    /// Port for the Prometheus scrape endpoint.
    pub metrics_port: u16,
    /// Per-subscription channel capacity.
    pub subscription_buffer: usize,
    /// Notifications the in-process store keeps before evicting the oldest.
    pub store_capacity: usize,
    /// Base URL for links in emails.
    pub frontend_url: String,
    pub company_name: String,
}

impl FromEnv for NotifierConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let subscription_buffer = env_parse("SUBSCRIPTION_BUFFER", DEFAULT_SUBSCRIPTION_BUFFER)?;
        if subscription_buffer == 0 {
            return Err(ConfigError::ParseError {
                key: "SUBSCRIPTION_BUFFER".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        let store_capacity = env_parse("NOTIFICATION_STORE_CAPACITY", DEFAULT_STORE_CAPACITY)?;
        if store_capacity == 0 {
            return Err(ConfigError::ParseError {
                key: "NOTIFICATION_STORE_CAPACITY".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            nats: NatsConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            metrics_port: env_parse("METRICS_PORT", 9464)?,
            subscription_buffer,
            store_capacity,
            frontend_url: env_or_default("FRONTEND_URL", "http://localhost:3000"),
            company_name: env_or_default("COMPANY_NAME", "Zerg"),
        })
    }
}
