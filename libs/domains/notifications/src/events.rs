//! Domain events and the JSON envelope they travel in.

use crate::error::{NotificationError, NotificationResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

/// Every event type the notifier subscribes to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    StoryCreated,
    StoryUpdated,
    CommentCreated,
    CommentReplied,
    UserMentioned,
    ObjectiveUpdated,
    KeyResultUpdated,
    EmailVerification,
    InvitationEmail,
    InvitationAccepted,
    WorkspaceDeletionConfirmation,
    WorkspaceDeleted,
    WorkspaceRestoreConfirmation,
    WorkspaceRestored,
}

/// How the dispatch loop handles an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Evaluated by the rule engine, intents persisted.
    Rules,
    /// Single-recipient templated email, no rule evaluation.
    Email,
}

impl EventType {
    /// Bus subject this event type is published on.
    pub fn subject(self) -> &'static str {
        match self {
            Self::StoryCreated => "story.created",
            Self::StoryUpdated => "story.updated",
            Self::CommentCreated => "comment.created",
            Self::CommentReplied => "comment.replied",
            Self::UserMentioned => "user.mentioned",
            Self::ObjectiveUpdated => "objective.updated",
            Self::KeyResultUpdated => "key_result.updated",
            Self::EmailVerification => "email.verification",
            Self::InvitationEmail => "invitation.email",
            Self::InvitationAccepted => "invitation.accepted",
            Self::WorkspaceDeletionConfirmation => "workspace.deletion_confirmation",
            Self::WorkspaceDeleted => "workspace.deleted",
            Self::WorkspaceRestoreConfirmation => "workspace.restore_confirmation",
            Self::WorkspaceRestored => "workspace.restored",
        }
    }

    pub fn route(self) -> Route {
        match self {
            Self::StoryCreated
            | Self::StoryUpdated
            | Self::CommentCreated
            | Self::CommentReplied
            | Self::UserMentioned
            | Self::ObjectiveUpdated
            | Self::KeyResultUpdated => Route::Rules,
            Self::EmailVerification
            | Self::InvitationEmail
            | Self::InvitationAccepted
            | Self::WorkspaceDeletionConfirmation
            | Self::WorkspaceDeleted
            | Self::WorkspaceRestoreConfirmation
            | Self::WorkspaceRestored => Route::Email,
        }
    }

    /// The fixed subject set the consumer subscribes to at startup.
    pub fn subjects() -> Vec<&'static str> {
        Self::iter().map(Self::subject).collect()
    }
}

/// Envelope for every event on the bus: `{type, actor_id, payload, timestamp}`.
///
/// The payload stays a generic JSON value until a handler decodes it into its
/// typed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Who caused the event. Nil for system events.
    #[serde(default)]
    pub actor_id: Uuid,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Informational only; no ordering is derived from it.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new<P: Serialize>(
        event_type: EventType,
        actor_id: Uuid,
        payload: &P,
    ) -> NotificationResult<Self> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| NotificationError::payload(event_type.as_ref(), e))?;
        Ok(Self {
            event_type: event_type.to_string(),
            actor_id,
            payload,
            timestamp: Utc::now(),
        })
    }

    /// Decode an envelope from raw bus bytes.
    pub fn from_slice(bytes: &[u8]) -> NotificationResult<Self> {
        serde_json::from_slice(bytes).map_err(NotificationError::Envelope)
    }

    pub fn to_bytes(&self) -> NotificationResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| NotificationError::Internal(e.to_string()))
    }

    /// Resolve the envelope's type string.
    pub fn kind(&self) -> NotificationResult<EventType> {
        self.event_type
            .parse()
            .map_err(|_| NotificationError::UnknownEventType(self.event_type.clone()))
    }

    /// Decode the generic payload into the handler's typed struct.
    pub fn decode_payload<P: DeserializeOwned>(&self) -> NotificationResult<P> {
        P::deserialize(&self.payload)
            .map_err(|e| NotificationError::payload(self.event_type.clone(), e))
    }
}
