use crate::{env_optional, env_or_default, ConfigError, FromEnv};

/// NATS connection settings for pub/sub consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NatsConfig {
    pub url: String,
    /// Client name reported to the NATS server.
    pub client_name: String,
    /// Queue group shared by loop instances. `None` means every instance
    /// receives every message.
    pub queue_group: Option<String>,
}

impl NatsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: "zerg-notifier".to_string(),
            queue_group: None,
        }
    }

    pub fn with_queue_group(mut self, group: impl Into<String>) -> Self {
        self.queue_group = Some(group.into());
        self
    }
}

impl FromEnv for NatsConfig {
    /// - NATS_URL: defaults to nats://localhost:4222
    /// - NATS_CLIENT_NAME: defaults to zerg-notifier
    /// - NATS_QUEUE_GROUP: optional
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_or_default("NATS_URL", "nats://localhost:4222"),
            client_name: env_or_default("NATS_CLIENT_NAME", "zerg-notifier"),
            queue_group: env_optional("NATS_QUEUE_GROUP"),
        })
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self::new("nats://localhost:4222")
    }
}
