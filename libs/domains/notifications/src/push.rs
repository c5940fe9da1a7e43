//! Real-time push of persisted notifications.
//!
//! An SSE endpoint subscribes to the hub and filters by recipient. Nobody
//! listening is not an error.

use crate::error::NotificationResult;
use crate::models::Notification;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

pub const DEFAULT_PUSH_CAPACITY: usize = 1024;

#[async_trait]
pub trait PushHub: Send + Sync {
    async fn push(&self, notification: &Notification) -> NotificationResult<()>;
}

/// Fan-out over a tokio broadcast channel.
///
/// Slow receivers lag and lose the oldest notifications.
#[derive(Clone)]
pub struct BroadcastPushHub {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastPushHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastPushHub {
    fn default() -> Self {
        Self::new(DEFAULT_PUSH_CAPACITY)
    }
}

#[async_trait]
impl PushHub for BroadcastPushHub {
    async fn push(&self, notification: &Notification) -> NotificationResult<()> {
        match self.sender.send(notification.clone()) {
            Ok(receivers) => trace!(receivers, "Notification pushed"),
            Err(_) => trace!("No push receivers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;
    use crate::models::{EntityType, NotificationIntent, NotificationType};
    use uuid::Uuid;

    fn notification() -> Notification {
        Notification::from_intent(NotificationIntent {
            recipient_id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            notification_type: NotificationType::CommentReply,
            entity_type: EntityType::Story,
            entity_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            title: "Fix login".into(),
            message: Message::Replied {
                actor: "Ada".into(),
                comment: "done".into(),
            }
            .into(),
        })
    }

    #[tokio::test]
    async fn test_push_without_receivers_is_ok() {
        let hub = BroadcastPushHub::default();
        assert_eq!(hub.receiver_count(), 0);
        hub.push(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn test_push_reaches_every_receiver() {
        let hub = BroadcastPushHub::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        let sent = notification();

        hub.push(&sent).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), sent);
        assert_eq!(second.recv().await.unwrap(), sent);
    }
}
