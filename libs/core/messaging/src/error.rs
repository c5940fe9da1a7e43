//! Error types for bus operations.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors raised by a [`MessageBus`](crate::MessageBus) implementation.
#[derive(Debug, Error)]
pub enum BusError {
    /// Could not reach the broker.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Subscribing to a subject failed.
    #[error("Failed to subscribe to '{subject}': {message}")]
    Subscribe { subject: String, message: String },

    /// Publishing to a subject failed.
    #[error("Failed to publish to '{subject}': {message}")]
    Publish { subject: String, message: String },

    /// The bus was shut down.
    #[error("Bus is closed")]
    Closed,
}

impl BusError {
    pub fn subscribe(subject: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Subscribe {
            subject: subject.into(),
            message: error.to_string(),
        }
    }

    pub fn publish(subject: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Publish {
            subject: subject.into(),
            message: error.to_string(),
        }
    }
}
