//! Error types for the notifications domain.

use crate::template::TemplateError;
use messaging::BusError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in the notification pipeline.
///
/// None of these stop the dispatch loop. [`kind`](Self::kind) groups them for
/// logs and metrics.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The outer event envelope could not be decoded.
    #[error("Malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The typed payload for a known event type could not be decoded.
    #[error("Malformed {event_type} payload: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// The payload decoded but is unusable (for example, no recipients).
    #[error("Invalid {event_type} payload: {reason}")]
    InvalidPayload { event_type: String, reason: String },

    /// The envelope names an event type this consumer does not handle.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// Notification store failure.
    #[error("Notification store error: {0}")]
    Store(String),

    /// Email sending or rendering failure.
    #[error("Mailer error: {0}")]
    Mailer(String),

    /// Real-time push failure.
    #[error("Push error: {0}")]
    Push(String),

    /// Message template error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Event bus error.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotificationError {
    /// Stable category label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Envelope(_) | Self::Payload { .. } | Self::InvalidPayload { .. } => "decode",
            Self::UnknownEventType(_) => "routing",
            Self::Store(_) | Self::Mailer(_) | Self::Push(_) => "sink",
            Self::Template(_) => "template",
            Self::Bus(_) => "bus",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    pub(crate) fn payload(event_type: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Payload {
            event_type: event_type.into(),
            source,
        }
    }

    pub(crate) fn invalid(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event_type: event_type.into(),
            reason: reason.into(),
        }
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Mailer(format!("Template rendering failed: {}", err))
    }
}
