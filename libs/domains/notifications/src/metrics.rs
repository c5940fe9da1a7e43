//! Prometheus metrics for the dispatch loop.
//!
//! Recording is a no-op until the binary installs a recorder. Messages are
//! labelled by bus subject, which is known even when the envelope is garbage.

use crate::models::NotificationType;
use metrics::{counter, histogram};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ConsumerMetrics;

impl ConsumerMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn message_received(&self, subject: &str) {
        counter!(
            "notifier_messages_received_total",
            "subject" => subject.to_string()
        )
        .increment(1);
    }

    /// `kind` is [`NotificationError::kind`](crate::NotificationError::kind).
    pub fn message_failed(&self, subject: &str, kind: &'static str) {
        counter!(
            "notifier_messages_failed_total",
            "subject" => subject.to_string(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn notification_created(&self, notification_type: NotificationType) {
        counter!(
            "notifier_notifications_created_total",
            "notification_type" => notification_type.to_string()
        )
        .increment(1);
    }

    pub fn email_sent(&self, template: &str) {
        counter!(
            "notifier_emails_sent_total",
            "template" => template.to_string()
        )
        .increment(1);
    }

    pub fn message_handled(&self, subject: &str, duration: Duration) {
        histogram!(
            "notifier_message_duration_seconds",
            "subject" => subject.to_string()
        )
        .record(duration.as_secs_f64());
    }
}
