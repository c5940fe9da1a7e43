//! SMTP mailer using lettre.
//!
//! Without TLS it talks plain SMTP, which is what Mailpit/MailHog expect in
//! local development.

use super::templates::{EmailTemplate, TemplateEngine};
use super::Mailer;
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// SMTP configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_email: String,
    pub from_name: String,
    /// Optional for dev servers like Mailpit.
    pub username: Option<String>,
    pub password: Option<String>,
    /// False for local dev servers.
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: String, port: u16, from_email: String, from_name: String) -> Self {
        Self {
            host,
            port,
            from_email,
            from_name,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    /// Builder method to set TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

impl FromEnv for SmtpConfig {
    /// Defaults target a local Mailpit on port 1025.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 1025)?,
            from_email: env_or_default("SMTP_FROM_EMAIL", "noreply@localhost"),
            from_name: env_or_default("SMTP_FROM_NAME", "Zerg"),
            username: env_optional("SMTP_USERNAME"),
            password: env_optional("SMTP_PASSWORD"),
            use_tls: env_optional("SMTP_USE_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

/// Mailer that renders [`EmailTemplate`]s and delivers over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
    engine: TemplateEngine,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig, engine: TemplateEngine) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config: Arc::new(config),
            engine,
        })
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = if config.use_tls {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| {
                    NotificationError::Config(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        };

        Ok(transport)
    }

    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        text: String,
        html: String,
    ) -> NotificationResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid from address: {}", e)))?;

        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                NotificationError::Mailer(format!("Invalid recipient '{}': {}", recipient, e))
            })?;
            builder = builder.to(to);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| NotificationError::Mailer(format!("Failed to build email message: {}", e)))
    }

    pub async fn health_check(&self) -> NotificationResult<bool> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| NotificationError::Mailer(format!("SMTP health check failed: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, data), fields(host = %self.config.host, recipients = recipients.len()))]
    async fn send_templated(
        &self,
        recipients: &[String],
        template: &str,
        subject: &str,
        data: &serde_json::Value,
    ) -> NotificationResult<()> {
        if recipients.is_empty() {
            return Err(NotificationError::Mailer("No recipients".to_string()));
        }
        let template: EmailTemplate = template
            .parse()
            .map_err(|_| {
                NotificationError::Mailer(format!("Unknown email template '{}'", template))
            })?;

        let rendered = self.engine.render(template, subject, data)?;
        let message =
            self.build_message(recipients, &rendered.subject, rendered.text, rendered.html)?;

        debug!(template = %template, "Sending email via SMTP");
        let response = self.transport.send(message).await.map_err(|e| {
            error!(template = %template, error = %e, "Failed to send email via SMTP");
            NotificationError::Mailer(format!("SMTP send failed: {}", e))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());
        info!(template = %template, message_id = ?message_id, "Email sent via SMTP");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
