//! Notification rule engine.
//!
//! Turns a domain event into an ordered list of [`NotificationIntent`]s. The
//! engine performs no writes; it only reads display data through
//! [`Lookups`], and a failed lookup degrades to a [`Fallback`] value. The only
//! errors it returns are for envelopes and payloads that cannot be decoded.
//!
//! One entry point exists per event type. [`RuleEngine::evaluate`] decodes
//! the payload and picks the right one.

mod assignment;
mod comment;
mod fields;
mod intents;
mod okr;
mod story;

pub use assignment::{classify, AssignmentTransition};
pub use intents::{should_notify, IntentSet};

use crate::error::NotificationResult;
use crate::events::{Event, EventType};
use crate::lookups::{Fallback, LookupResultExt, Lookups};
use crate::messages::Message;
use crate::models::{EntityType, NotificationIntent, NotificationType};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Stateless evaluator; safe to share between dispatch loops.
#[derive(Clone)]
pub struct RuleEngine {
    lookups: Arc<dyn Lookups>,
}

impl RuleEngine {
    pub fn new(lookups: Arc<dyn Lookups>) -> Self {
        Self { lookups }
    }

    /// Evaluate any rule-routed event.
    ///
    /// Email-only event types produce no intents.
    #[instrument(
        skip(self, event),
        fields(event_type = %event.event_type, actor_id = %event.actor_id)
    )]
    pub async fn evaluate(&self, event: &Event) -> NotificationResult<Vec<NotificationIntent>> {
        let actor = event.actor_id;
        let intents = match event.kind()? {
            EventType::StoryCreated => self.story_created(actor, &event.decode_payload()?).await,
            EventType::StoryUpdated => self.story_updated(actor, &event.decode_payload()?).await,
            EventType::CommentCreated => {
                self.comment_created(actor, &event.decode_payload()?).await
            }
            EventType::CommentReplied => {
                self.comment_replied(actor, &event.decode_payload()?).await
            }
            EventType::UserMentioned => self.user_mentioned(actor, &event.decode_payload()?).await,
            EventType::ObjectiveUpdated => {
                self.objective_updated(actor, &event.decode_payload()?).await
            }
            EventType::KeyResultUpdated => {
                self.key_result_updated(actor, &event.decode_payload()?).await
            }
            other => {
                debug!(event_type = %other, "No notification rules for event type");
                Vec::new()
            }
        };

        debug!(count = intents.len(), "Rules evaluated");
        Ok(intents)
    }

    async fn actor_name(&self, actor_id: Uuid) -> String {
        self.lookups
            .user_name(actor_id)
            .await
            .or_fallback(Fallback::UserName)
    }

    async fn story_title(&self, story_id: Uuid, workspace_id: Uuid) -> String {
        self.lookups
            .story_title(story_id, workspace_id)
            .await
            .or_fallback(Fallback::StoryTitle)
    }
}

/// Fields shared by every intent one rule invocation produces.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub workspace_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub notification_type: NotificationType,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub title: String,
}

impl Target {
    pub fn intent(&self, recipient_id: Uuid, message: Message) -> NotificationIntent {
        NotificationIntent {
            recipient_id,
            workspace_id: self.workspace_id,
            notification_type: self.notification_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            actor_id: self.actor_id,
            title: self.title.clone(),
            message: message.into(),
        }
    }
}
