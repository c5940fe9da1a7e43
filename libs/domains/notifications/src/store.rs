//! Notification persistence contract.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationIntent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persists intents produced by the rule engine.
///
/// Uniqueness and other consistency rules belong to the implementation; the
/// dispatch loop only calls [`create`](Self::create) once per intent.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, intent: NotificationIntent) -> NotificationResult<Notification>;
}

/// Default number of notifications [`InMemoryNotificationStore::new`] keeps.
pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// In-process store for local wiring and tests.
///
/// Holds at most `capacity` notifications; once full, each write evicts the
/// oldest entry.
#[derive(Clone)]
pub struct InMemoryNotificationStore {
    notifications: Arc<RwLock<VecDeque<Notification>>>,
    capacity: usize,
    failure_message: Option<String>,
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STORE_CAPACITY)
    }
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps the newest `capacity` notifications (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notifications: Arc::default(),
            capacity: capacity.max(1),
            failure_message: None,
        }
    }

    /// A store whose every write fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub async fn list(&self) -> Vec<Notification> {
        self.notifications.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notifications.read().await.is_empty()
    }

    /// Newest first.
    pub async fn for_recipient(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, intent: NotificationIntent) -> NotificationResult<Notification> {
        if let Some(message) = &self.failure_message {
            return Err(NotificationError::Store(message.clone()));
        }

        let notification = Notification::from_intent(intent);
        let mut notifications = self.notifications.write().await;
        while notifications.len() >= self.capacity {
            notifications.pop_front();
        }
        notifications.push_back(notification.clone());
        Ok(notification)
    }
}
