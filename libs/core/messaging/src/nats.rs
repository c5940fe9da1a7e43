//! NATS implementation of the MessageBus trait

use crate::bus::{MessageBus, Subscription, DEFAULT_SUBSCRIPTION_BUFFER};
use crate::error::{BusError, BusResult};
use crate::message::Message;
use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// NATS-backed bus over core subjects.
///
/// With a queue group set, each message on a subject is delivered to exactly
/// one member of the group, which is how replicas share the load.
pub struct NatsBus {
    client: Client,
    queue_group: Option<String>,
    buffer: usize,
}

impl NatsBus {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> BusResult<Self> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Connection(format!("{url}: {e}")))?;

        Ok(Self::from_client(client))
    }

    /// Connect with a client name visible in server monitoring
    pub async fn connect_with_options(url: &str, name: &str) -> BusResult<Self> {
        let client = async_nats::ConnectOptions::new()
            .name(name)
            .connect(url)
            .await
            .map_err(|e| BusError::Connection(format!("{url}: {e}")))?;

        info!(url = %url, name = %name, "Connected to NATS");
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            queue_group: None,
            buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }

    pub fn with_queue_group(mut self, queue_group: Option<String>) -> Self {
        self.queue_group = queue_group;
        self
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Get the underlying NATS client for advanced operations
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn subscribe_one(&self, subject: &str) -> BusResult<Subscriber> {
        let result = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(subject.to_string(), group.clone())
                    .await
            }
            None => self.client.subscribe(subject.to_string()).await,
        };
        result.map_err(|e| BusError::subscribe(subject, e))
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    #[instrument(skip(self), fields(queue_group = ?self.queue_group))]
    async fn subscribe(&self, subjects: &[&str]) -> BusResult<Subscription> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut forwarders: Vec<JoinHandle<()>> = Vec::with_capacity(subjects.len());

        for subject in subjects {
            let subscriber = match self.subscribe_one(subject).await {
                Ok(subscriber) => subscriber,
                Err(e) => {
                    for forwarder in &forwarders {
                        forwarder.abort();
                    }
                    return Err(e);
                }
            };
            forwarders.push(tokio::spawn(forward(subscriber, tx.clone())));
            debug!(subject = %subject, "Subscribed");
        }

        let subjects = subjects.iter().map(|s| s.to_string()).collect();
        Ok(Subscription::new(subjects, rx).with_forwarders(forwarders))
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::publish(subject, e))
    }

    async fn flush(&self) -> BusResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))
    }
}

/// Pump one NATS subscriber into the shared channel until either side closes.
async fn forward(mut subscriber: Subscriber, tx: mpsc::Sender<Message>) {
    while let Some(msg) = subscriber.next().await {
        let message = Message::new(msg.subject.to_string(), msg.payload.to_vec());
        if tx.send(message).await.is_err() {
            break;
        }
    }

    if let Err(e) = subscriber.unsubscribe().await {
        warn!(error = %e, "Failed to unsubscribe from NATS");
    }
}
