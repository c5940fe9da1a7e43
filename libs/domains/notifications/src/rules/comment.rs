use super::{should_notify, IntentSet, RuleEngine, Target};
use crate::messages::Message;
use crate::models::{EntityType, NotificationIntent, NotificationType};
use crate::payloads::{CommentCreatedPayload, CommentRepliedPayload, UserMentionedPayload};
use tracing::{debug, warn};
use uuid::Uuid;

impl RuleEngine {
    async fn comment_target(
        &self,
        actor_id: Uuid,
        story_id: Uuid,
        workspace_id: Uuid,
        notification_type: NotificationType,
    ) -> Target {
        Target {
            workspace_id,
            entity_type: EntityType::Story,
            entity_id: story_id,
            notification_type,
            actor_id,
            actor_name: self.actor_name(actor_id).await,
            title: self.story_title(story_id, workspace_id).await,
        }
    }

    /// A new comment notifies the story's current assignee.
    pub async fn comment_created(
        &self,
        actor_id: Uuid,
        payload: &CommentCreatedPayload,
    ) -> Vec<NotificationIntent> {
        let assignee = match self
            .lookups
            .story_assignee(payload.story_id, payload.workspace_id)
            .await
        {
            Ok(Some(assignee)) if should_notify(assignee, actor_id) => assignee,
            Ok(_) => return Vec::new(),
            Err(e) => {
                warn!(
                    story_id = %payload.story_id,
                    error = %e,
                    "Cannot resolve assignee for comment"
                );
                return Vec::new();
            }
        };

        let target = self
            .comment_target(
                actor_id,
                payload.story_id,
                payload.workspace_id,
                NotificationType::StoryComment,
            )
            .await;
        let message = Message::Commented {
            actor: target.actor_name.clone(),
            comment: payload.content.clone(),
        };

        let mut intents = IntentSet::new();
        intents.push(target.intent(assignee, message));
        intents.into_vec()
    }

    /// A reply notifies the author of the parent comment.
    pub async fn comment_replied(
        &self,
        actor_id: Uuid,
        payload: &CommentRepliedPayload,
    ) -> Vec<NotificationIntent> {
        if !should_notify(payload.parent_author_id, actor_id) {
            return Vec::new();
        }

        let target = self
            .comment_target(
                actor_id,
                payload.story_id,
                payload.workspace_id,
                NotificationType::CommentReply,
            )
            .await;
        let message = Message::Replied {
            actor: target.actor_name.clone(),
            comment: payload.content.clone(),
        };

        let mut intents = IntentSet::new();
        intents.push(target.intent(payload.parent_author_id, message));
        intents.into_vec()
    }

    /// A mention notifies the mentioned user, unless that user is the story's
    /// assignee: the comment notification already reached them.
    pub async fn user_mentioned(
        &self,
        actor_id: Uuid,
        payload: &UserMentionedPayload,
    ) -> Vec<NotificationIntent> {
        let mentioned = payload.mentioned_user_id;
        if !should_notify(mentioned, actor_id) {
            return Vec::new();
        }

        match self
            .lookups
            .story_assignee(payload.story_id, payload.workspace_id)
            .await
        {
            Ok(Some(assignee)) if assignee == mentioned => {
                debug!(
                    story_id = %payload.story_id,
                    recipient_id = %mentioned,
                    "Mention covered by comment notification to assignee"
                );
                return Vec::new();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    story_id = %payload.story_id,
                    error = %e,
                    "Cannot resolve assignee, delivering mention"
                );
            }
        }

        let target = self
            .comment_target(
                actor_id,
                payload.story_id,
                payload.workspace_id,
                NotificationType::Mention,
            )
            .await;
        let message = Message::Mentioned {
            actor: target.actor_name.clone(),
        };

        let mut intents = IntentSet::new();
        intents.push(target.intent(mentioned, message));
        intents.into_vec()
    }
}
