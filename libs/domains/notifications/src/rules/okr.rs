use super::fields::FieldEdit;
use super::{RuleEngine, Target};
use crate::lookups::{Fallback, LookupResultExt};
use crate::models::{EntityType, NotificationIntent, NotificationType};
use crate::payloads::{KeyResultUpdatedPayload, ObjectiveUpdatedPayload};
use uuid::Uuid;

impl RuleEngine {
    /// Owner changes first; otherwise status, then due date.
    pub async fn objective_updated(
        &self,
        actor_id: Uuid,
        payload: &ObjectiveUpdatedPayload,
    ) -> Vec<NotificationIntent> {
        let updates = &payload.updates;
        let target = Target {
            workspace_id: payload.workspace_id,
            entity_type: EntityType::Objective,
            entity_id: payload.objective_id,
            notification_type: NotificationType::ObjectiveUpdate,
            actor_id,
            actor_name: self.actor_name(actor_id).await,
            title: self
                .lookups
                .objective_title(payload.objective_id, payload.workspace_id)
                .await
                .or_fallback(Fallback::ObjectiveTitle),
        };
        let edits = [
            FieldEdit::Status(&updates.status_id),
            FieldEdit::DueDate(&updates.due_date),
        ];

        self.owned_update(
            &target,
            payload.owner_id,
            &updates.owner_id,
            &edits,
            !updates.other.is_empty(),
        )
        .await
    }

    /// Owner changes first; otherwise status, then progress, then due date.
    pub async fn key_result_updated(
        &self,
        actor_id: Uuid,
        payload: &KeyResultUpdatedPayload,
    ) -> Vec<NotificationIntent> {
        let updates = &payload.updates;
        let target = Target {
            workspace_id: payload.workspace_id,
            entity_type: EntityType::KeyResult,
            entity_id: payload.key_result_id,
            notification_type: NotificationType::KeyResultUpdate,
            actor_id,
            actor_name: self.actor_name(actor_id).await,
            title: self
                .lookups
                .key_result_title(payload.key_result_id, payload.workspace_id)
                .await
                .or_fallback(Fallback::KeyResultTitle),
        };
        let edits = [
            FieldEdit::Status(&updates.status_id),
            FieldEdit::Progress(&updates.progress),
            FieldEdit::DueDate(&updates.due_date),
        ];

        self.owned_update(
            &target,
            payload.owner_id,
            &updates.owner_id,
            &edits,
            !updates.other.is_empty(),
        )
        .await
    }
}
