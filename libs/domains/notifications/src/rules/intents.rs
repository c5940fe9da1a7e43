use crate::models::{NotificationIntent, NotificationType};
use std::collections::HashSet;
use tracing::trace;
use uuid::Uuid;

/// Nobody is notified about their own action.
pub fn should_notify(recipient: Uuid, actor: Uuid) -> bool {
    recipient != actor
}

/// Ordered intents for one event.
///
/// [`push`](Self::push) is the final gate for every rule: it drops
/// self-notifications and keeps only the first intent per
/// `(recipient, entity, type)`.
#[derive(Debug, Default)]
pub struct IntentSet {
    seen: HashSet<(Uuid, Uuid, NotificationType)>,
    intents: Vec<NotificationIntent>,
}

impl IntentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the intent was kept.
    pub fn push(&mut self, intent: NotificationIntent) -> bool {
        if !should_notify(intent.recipient_id, intent.actor_id) {
            trace!(recipient_id = %intent.recipient_id, "Suppressed self-notification");
            return false;
        }
        if !self.seen.insert(intent.dedup_key()) {
            trace!(recipient_id = %intent.recipient_id, "Suppressed duplicate notification");
            return false;
        }
        self.intents.push(intent);
        true
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn into_vec(self) -> Vec<NotificationIntent> {
        self.intents
    }
}
