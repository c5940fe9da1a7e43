//! Data models for the notifications domain.

use crate::template::MessageTemplate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Category of an in-app notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    StoryUpdate,
    StoryComment,
    CommentReply,
    Mention,
    ObjectiveUpdate,
    KeyResultUpdate,
}

/// The kind of entity a notification points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    Story,
    Objective,
    KeyResult,
}

impl EntityType {
    /// Noun used in messages, e.g. "task" in "assigned you a task".
    pub fn noun(self) -> &'static str {
        match self {
            Self::Story => "task",
            Self::Objective => "objective",
            Self::KeyResult => "key result",
        }
    }

    /// Noun with its indefinite article.
    pub fn indefinite(self) -> &'static str {
        match self {
            Self::Story => "a task",
            Self::Objective => "an objective",
            Self::KeyResult => "a key result",
        }
    }
}

/// The rule engine's output: one notification for one recipient, not yet
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient_id: Uuid,
    pub workspace_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub actor_id: Uuid,
    pub title: String,
    pub message: MessageTemplate,
}

impl NotificationIntent {
    /// At most one intent per key is produced for a single event.
    pub fn dedup_key(&self) -> (Uuid, Uuid, NotificationType) {
        (self.recipient_id, self.entity_id, self.notification_type)
    }
}

/// A persisted notification, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub workspace_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub actor_id: Uuid,
    pub title: String,
    pub message: MessageTemplate,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification from an intent.
    pub fn from_intent(intent: NotificationIntent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            recipient_id: intent.recipient_id,
            workspace_id: intent.workspace_id,
            notification_type: intent.notification_type,
            entity_type: intent.entity_type,
            entity_id: intent.entity_id,
            actor_id: intent.actor_id,
            title: intent.title,
            message: intent.message,
            read_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn mark_read(&mut self) {
        let now = Utc::now();
        self.read_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::VariableType;

    fn intent() -> NotificationIntent {
        NotificationIntent {
            recipient_id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            notification_type: NotificationType::StoryUpdate,
            entity_type: EntityType::Story,
            entity_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            title: "Fix login".into(),
            message: MessageTemplate::builder("{actor} updated the task")
                .var("actor", "Ada", VariableType::Actor)
                .build()
                .unwrap(),
        }
    }

    #[test]
    fn test_from_intent_is_unread() {
        let intent = intent();
        let mut notification = Notification::from_intent(intent.clone());

        assert_eq!(notification.recipient_id, intent.recipient_id);
        assert_eq!(notification.message, intent.message);
        assert!(!notification.is_read());

        notification.mark_read();
        assert!(notification.is_read());
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(intent()).unwrap();
        assert_eq!(value["type"], "story_update");
        assert_eq!(value["entity_type"], "story");
        assert_eq!(NotificationType::KeyResultUpdate.to_string(), "key_result_update");
    }
}
