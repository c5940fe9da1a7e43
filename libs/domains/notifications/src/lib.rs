//! Notifications Domain
//!
//! Turns project-tracking events into in-app notifications and transactional
//! emails.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Event bus    │  ← story.*, comment.*, objective.*, workspace.* ...
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Dispatch loop   │  ← decode envelope, route by type
//! └───┬─────────┬───┘
//!     │         │
//! ┌───▼─────┐ ┌─▼──────────────┐
//! │  Rules  │ │ Email composer │  ← verification, invitations, lifecycle
//! └───┬─────┘ └─┬──────────────┘
//!     │         │
//! ┌───▼─────┐ ┌─▼──────┐
//! │  Store  │ │ Mailer │
//! └───┬─────┘ └────────┘
//!     │
//! ┌───▼─────┐
//! │  Push   │  ← SSE fan-out
//! └─────────┘
//! ```
//!
//! The rule engine never writes. It reads display names through [`Lookups`]
//! and falls back to fixed strings when a lookup fails.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{
//!     EmailComposer, InMemoryDirectory, InMemoryNotificationStore,
//!     NotificationConsumer, RecordingMailer, RuleEngine,
//! };
//! use messaging::InMemoryBus;
//! use std::sync::Arc;
//!
//! let consumer = NotificationConsumer::new(
//!     Arc::new(InMemoryBus::new()),
//!     RuleEngine::new(Arc::new(InMemoryDirectory::new())),
//!     Arc::new(InMemoryNotificationStore::new()),
//!     Arc::new(RecordingMailer::new()),
//!     EmailComposer::new("http://localhost:3000", "Zerg"),
//! );
//! let handle = consumer.spawn().await?;
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod consumer;
pub mod emails;
pub mod error;
pub mod events;
pub mod lookups;
pub mod mailer;
pub mod messages;
pub mod metrics;
pub mod models;
pub mod payloads;
pub mod push;
pub mod rules;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use consumer::{ConsumerHandle, Handled, NotificationConsumer, StopReason};
pub use emails::{ComposedEmail, EmailComposer};
pub use error::{NotificationError, NotificationResult};
pub use events::{Event, EventType, Route};
pub use lookups::{Fallback, InMemoryDirectory, LookupError, LookupResult, Lookups};
pub use mailer::{
    EmailTemplate, Mailer, RecordingMailer, SentMail, SmtpConfig, SmtpMailer, TemplateEngine,
};
pub use messages::Message;
pub use metrics::ConsumerMetrics;
pub use models::{EntityType, Notification, NotificationIntent, NotificationType};
pub use payloads::{DueDate, FieldChange};
pub use push::{BroadcastPushHub, PushHub};
pub use rules::{should_notify, RuleEngine};
pub use store::{InMemoryNotificationStore, NotificationStore, DEFAULT_STORE_CAPACITY};
pub use template::{MessageTemplate, TemplateError, TranslationCatalog, Variable, VariableType};
