use super::fields::FieldEdit;
use super::{should_notify, IntentSet, RuleEngine, Target};
use crate::messages::Message;
use crate::models::{EntityType, NotificationIntent, NotificationType};
use crate::payloads::{StoryCreatedPayload, StoryUpdatedPayload};
use uuid::Uuid;

impl RuleEngine {
    /// A story created with an assignee notifies that assignee.
    pub async fn story_created(
        &self,
        actor_id: Uuid,
        payload: &StoryCreatedPayload,
    ) -> Vec<NotificationIntent> {
        let Some(assignee) = payload.assignee_id.filter(|id| should_notify(*id, actor_id)) else {
            return Vec::new();
        };

        let title = match payload.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.story_title(payload.story_id, payload.workspace_id).await,
        };
        let target = Target {
            workspace_id: payload.workspace_id,
            entity_type: EntityType::Story,
            entity_id: payload.story_id,
            notification_type: NotificationType::StoryUpdate,
            actor_id,
            actor_name: self.actor_name(actor_id).await,
            title,
        };

        let mut intents = IntentSet::new();
        intents.push(target.intent(
            assignee,
            Message::Assigned {
                actor: target.actor_name.clone(),
                entity: EntityType::Story,
            },
        ));
        intents.into_vec()
    }

    /// Assignment changes first; otherwise one field notification to the
    /// current assignee, picking priority, then status, then due date.
    pub async fn story_updated(
        &self,
        actor_id: Uuid,
        payload: &StoryUpdatedPayload,
    ) -> Vec<NotificationIntent> {
        let updates = &payload.updates;
        let target = Target {
            workspace_id: payload.workspace_id,
            entity_type: EntityType::Story,
            entity_id: payload.story_id,
            notification_type: NotificationType::StoryUpdate,
            actor_id,
            actor_name: self.actor_name(actor_id).await,
            title: self.story_title(payload.story_id, payload.workspace_id).await,
        };
        let edits = [
            FieldEdit::Priority(&updates.priority),
            FieldEdit::Status(&updates.status_id),
            FieldEdit::DueDate(&updates.end_date),
        ];

        self.owned_update(
            &target,
            payload.assignee_id,
            &updates.assignee_id,
            &edits,
            !updates.other.is_empty(),
        )
        .await
    }
}
