//! Assignment sub-machine shared by stories (assignee) and OKRs (owner).

use super::fields::FieldEdit;
use super::{should_notify, IntentSet, RuleEngine, Target};
use crate::lookups::{Fallback, LookupResultExt};
use crate::messages::{Message, THEMSELF};
use crate::models::NotificationIntent;
use crate::payloads::FieldChange;
use uuid::Uuid;

/// How an update moves responsibility for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTransition {
    /// Nobody before, someone now.
    Assigned { assignee: Uuid },
    /// One person before, a different person now.
    Reassigned { previous: Uuid, next: Uuid },
    /// Someone before, explicitly nobody now.
    Unassigned { previous: Uuid },
    /// Field absent, or set to what it already was.
    Unchanged,
}

/// Classify a change against the value held before the update.
pub fn classify(prior: Option<Uuid>, change: &FieldChange<Uuid>) -> AssignmentTransition {
    match (prior, change) {
        (_, FieldChange::Unchanged) => AssignmentTransition::Unchanged,
        (None, FieldChange::Set(next)) => AssignmentTransition::Assigned { assignee: *next },
        (Some(previous), FieldChange::Set(next)) if previous == *next => {
            AssignmentTransition::Unchanged
        }
        (Some(previous), FieldChange::Set(next)) => AssignmentTransition::Reassigned {
            previous,
            next: *next,
        },
        (Some(previous), FieldChange::Cleared) => AssignmentTransition::Unassigned { previous },
        (None, FieldChange::Cleared) => AssignmentTransition::Unchanged,
    }
}

impl RuleEngine {
    /// Assignment notifications if responsibility moved, otherwise at most one
    /// field notification to the current holder.
    pub(super) async fn owned_update(
        &self,
        target: &Target,
        prior: Option<Uuid>,
        change: &FieldChange<Uuid>,
        edits: &[FieldEdit<'_>],
        other_changed: bool,
    ) -> Vec<NotificationIntent> {
        let mut intents = IntentSet::new();

        match classify(prior, change) {
            AssignmentTransition::Unchanged => {
                if let Some(holder) = prior.filter(|id| should_notify(*id, target.actor_id)) {
                    let message = self
                        .field_message(target, edits, other_changed)
                        .await;
                    if let Some(message) = message {
                        intents.push(target.intent(holder, message));
                    }
                }
            }
            transition => self.push_assignment(target, transition, &mut intents).await,
        }

        intents.into_vec()
    }

    pub(super) async fn push_assignment(
        &self,
        target: &Target,
        transition: AssignmentTransition,
        intents: &mut IntentSet,
    ) {
        let actor = target.actor_name.clone();
        let entity = target.entity_type;

        match transition {
            AssignmentTransition::Assigned { assignee } => {
                intents.push(target.intent(assignee, Message::Assigned { actor, entity }));
            }
            AssignmentTransition::Reassigned { previous, next } => {
                if should_notify(previous, target.actor_id) {
                    let assignee = if next == target.actor_id {
                        THEMSELF.to_string()
                    } else {
                        self.lookups
                            .user_name(next)
                            .await
                            .or_fallback(Fallback::UserName)
                    };
                    intents.push(target.intent(
                        previous,
                        Message::Reassigned {
                            actor: actor.clone(),
                            assignee,
                            entity,
                        },
                    ));
                }
                intents.push(target.intent(next, Message::Assigned { actor, entity }));
            }
            AssignmentTransition::Unassigned { previous } => {
                intents.push(target.intent(previous, Message::Unassigned { actor }));
            }
            AssignmentTransition::Unchanged => {}
        }
    }
}
