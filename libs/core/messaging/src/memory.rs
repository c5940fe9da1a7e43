//! In-process bus.

use crate::bus::{MessageBus, Subscription, DEFAULT_SUBSCRIPTION_BUFFER};
use crate::error::{BusError, BusResult};
use crate::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{trace, warn};

/// Bus that routes messages between tasks of the same process.
///
/// Subjects match exactly (no wildcards). A full subscriber buffer drops the
/// message for that subscriber only, as a slow NATS core consumer would.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

struct Inner {
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Message>>>>,
    buffer: usize,
    closed: AtomicBool,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIPTION_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                buffer: buffer.max(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Number of live subscriptions on `subject`.
    pub async fn subscriber_count(&self, subject: &str) -> usize {
        let subscribers = self.inner.subscribers.lock().await;
        subscribers
            .get(subject)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Drop every subscription. Receivers drain what is buffered, then see
    /// end-of-stream. Later calls fail with [`BusError::Closed`].
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.subscribers.lock().await.clear();
    }

    fn ensure_open(&self) -> BusResult<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        Ok(())
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn subscribe(&self, subjects: &[&str]) -> BusResult<Subscription> {
        self.ensure_open()?;

        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let mut subscribers = self.inner.subscribers.lock().await;
        for subject in subjects {
            subscribers
                .entry(subject.to_string())
                .or_default()
                .push(tx.clone());
        }

        let subjects = subjects.iter().map(|s| s.to_string()).collect();
        Ok(Subscription::new(subjects, rx))
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.ensure_open()?;

        let mut subscribers = self.inner.subscribers.lock().await;
        let Some(senders) = subscribers.get_mut(subject) else {
            trace!(subject = %subject, "No subscribers");
            return Ok(());
        };

        senders.retain(|tx| {
            match tx.try_send(Message::new(subject, payload.clone())) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subject = %subject, "Subscriber buffer full, dropping message");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_arrive_in_publish_order() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe(&["a", "b"]).await.unwrap();

        bus.publish("a", b"1".to_vec()).await.unwrap();
        bus.publish("b", b"2".to_vec()).await.unwrap();
        bus.publish("a", b"3".to_vec()).await.unwrap();

        let received: Vec<_> = [
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|m| (m.subject, m.payload))
        .collect();

        assert_eq!(
            received,
            vec![
                ("a".to_string(), b"1".to_vec()),
                ("b".to_string(), b"2".to_vec()),
                ("a".to_string(), b"3".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unrelated_subjects_are_not_delivered() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe(&["a"]).await.unwrap();

        bus.publish("other", b"x".to_vec()).await.unwrap();
        bus.publish("a", b"y".to_vec()).await.unwrap();

        assert_eq!(sub.recv().await.unwrap().payload, b"y");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = InMemoryBus::new();
        assert!(bus.publish("nobody", b"x".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_full_buffer_drops_message() {
        let bus = InMemoryBus::with_buffer(1);
        let mut sub = bus.subscribe(&["a"]).await.unwrap();

        bus.publish("a", b"kept".to_vec()).await.unwrap();
        bus.publish("a", b"dropped".to_vec()).await.unwrap();

        assert_eq!(sub.recv().await.unwrap().payload, b"kept");
        bus.publish("a", b"next".to_vec()).await.unwrap();
        assert_eq!(sub.recv().await.unwrap().payload, b"next");
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe(&["a"]).await.unwrap();
        assert_eq!(bus.subscriber_count("a").await, 1);

        drop(sub);
        bus.publish("a", b"x".to_vec()).await.unwrap();
        assert_eq!(bus.subscriber_count("a").await, 0);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe(&["a"]).await.unwrap();

        bus.close().await;

        assert!(sub.recv().await.is_none());
        assert!(matches!(
            bus.publish("a", b"x".to_vec()).await,
            Err(BusError::Closed)
        ));
    }
}
