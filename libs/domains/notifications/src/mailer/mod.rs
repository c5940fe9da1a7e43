//! Templated email delivery.
//!
//! The dispatch loop only knows the [`Mailer`] contract: a template name, a
//! subject, recipients and JSON data. [`SmtpMailer`] renders with Handlebars
//! and sends through lettre; [`RecordingMailer`] captures sends in memory.

mod smtp;
mod templates;

pub use smtp::{SmtpConfig, SmtpMailer};
pub use templates::{EmailTemplate, RenderedEmail, TemplateEngine};

use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Render `template` with `data` and send it to every recipient.
    async fn send_templated(
        &self,
        recipients: &[String],
        template: &str,
        subject: &str,
        data: &serde_json::Value,
    ) -> NotificationResult<()>;

    /// Mailer name for logging.
    fn name(&self) -> &'static str;
}

/// A captured send.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub template: String,
    pub subject: String,
    pub data: serde_json::Value,
}

/// Mailer that records sends instead of delivering them
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    failure_message: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailer that always fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            failure_message: Some(message.into()),
        }
    }

    /// Get all sent emails
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Check if an email was sent to a specific address
    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent
            .lock()
            .await
            .iter()
            .any(|m| m.recipients.iter().any(|r| r == email))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_templated(
        &self,
        recipients: &[String],
        template: &str,
        subject: &str,
        data: &serde_json::Value,
    ) -> NotificationResult<()> {
        if let Some(message) = &self.failure_message {
            return Err(NotificationError::Mailer(message.clone()));
        }

        self.sent.lock().await.push(SentMail {
            recipients: recipients.to_vec(),
            template: template.to_string(),
            subject: subject.to_string(),
            data: data.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_mailer_captures_sends() {
        let mailer = RecordingMailer::new();
        mailer
            .send_templated(
                &["ada@example.com".to_string()],
                "email_verification",
                "Verify your email address",
                &json!({"name": "Ada"}),
            )
            .await
            .unwrap();

        assert_eq!(mailer.sent_count().await, 1);
        assert!(mailer.was_sent_to("ada@example.com").await);
        assert_eq!(mailer.sent().await[0].template, "email_verification");
    }

    #[tokio::test]
    async fn test_failing_mailer() {
        let mailer = RecordingMailer::failing("smtp down");
        let err = mailer
            .send_templated(&[], "workspace_deleted", "s", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "sink");
        assert_eq!(mailer.sent_count().await, 0);
    }
}
