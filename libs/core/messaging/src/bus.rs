use crate::error::BusResult;
use crate::message::Message;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default capacity of a subscription's merged channel.
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 256;

/// Abstract pub/sub bus.
///
/// Implementations:
/// - [`InMemoryBus`](crate::InMemoryBus): in-process, used by tests and local runs
/// - `NatsBus` (feature `nats`): NATS core subjects
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Subscribe to every subject in `subjects`, merging them into one channel.
    async fn subscribe(&self, subjects: &[&str]) -> BusResult<Subscription>;

    /// Publish raw bytes to a subject. Fire-and-forget.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Flush buffered publishes to the broker.
    async fn flush(&self) -> BusResult<()> {
        Ok(())
    }
}

/// A live subscription to one or more subjects.
///
/// All subjects feed the same channel, so a single consumer loop sees the
/// bus's delivery order. Dropping the subscription (or calling
/// [`unsubscribe`](Self::unsubscribe)) stops every forwarder.
pub struct Subscription {
    subjects: Vec<String>,
    receiver: mpsc::Receiver<Message>,
    forwarders: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(subjects: Vec<String>, receiver: mpsc::Receiver<Message>) -> Self {
        Self {
            subjects,
            receiver,
            forwarders: Vec::new(),
        }
    }

    /// Attach background tasks that feed this subscription's channel.
    pub fn with_forwarders(mut self, forwarders: Vec<JoinHandle<()>>) -> Self {
        self.forwarders = forwarders;
        self
    }

    /// Subjects this subscription listens on.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Wait for the next message. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Stop receiving. Messages already buffered are discarded.
    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.receiver.close();
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subjects", &self.subjects)
            .field("forwarders", &self.forwarders.len())
            .finish()
    }
}
