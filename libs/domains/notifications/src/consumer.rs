//! The event dispatch loop.
//!
//! One loop drains one subscription covering every [`EventType`] subject.
//! Messages are handled sequentially: decode, route, evaluate or compose, then
//! write to the sinks. A failure only loses the message (or the single
//! notification) it happened on; the loop keeps going.
//!
//! Delivery is at-most-once. A message in flight when the process dies is
//! gone, and nothing is retried.

use crate::emails::EmailComposer;
use crate::error::{NotificationError, NotificationResult};
use crate::events::{Event, EventType, Route};
use crate::mailer::Mailer;
use crate::metrics::ConsumerMetrics;
use crate::push::PushHub;
use crate::rules::RuleEngine;
use crate::store::NotificationStore;
use messaging::{Message as BusMessage, MessageBus, Subscription};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Why [`NotificationConsumer::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown signal fired (or its sender was dropped).
    Cancelled,
    /// The bus closed the subscription channel.
    SubscriptionClosed,
}

/// What happened to one message that was handled without a fatal error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Handled {
    /// Intents the rule engine produced.
    pub intents: usize,
    /// Intents the store accepted.
    pub persisted: usize,
    pub emails: usize,
}

pub struct NotificationConsumer {
    bus: Arc<dyn MessageBus>,
    engine: RuleEngine,
    store: Arc<dyn NotificationStore>,
    mailer: Arc<dyn Mailer>,
    push: Option<Arc<dyn PushHub>>,
    composer: EmailComposer,
    metrics: ConsumerMetrics,
}

impl NotificationConsumer {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        engine: RuleEngine,
        store: Arc<dyn NotificationStore>,
        mailer: Arc<dyn Mailer>,
        composer: EmailComposer,
    ) -> Self {
        Self {
            bus,
            engine,
            store,
            mailer,
            push: None,
            composer,
            metrics: ConsumerMetrics::new(),
        }
    }

    /// Push every persisted notification to `push`.
    pub fn with_push(mut self, push: Arc<dyn PushHub>) -> Self {
        self.push = Some(push);
        self
    }

    /// Subscribe and drain until cancelled or the subscription closes.
    ///
    /// Only a failed subscribe is returned as an error.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> NotificationResult<StopReason> {
        let subscription = self.subscribe().await?;
        Ok(self.drain(subscription, shutdown).await)
    }

    /// Subscribe, then run the loop on a background task.
    ///
    /// Subscribing happens before this returns, so anything published after
    /// it returns is seen by the loop.
    pub async fn spawn(self) -> NotificationResult<ConsumerHandle> {
        let subscription = self.subscribe().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.drain(subscription, shutdown_rx).await });

        Ok(ConsumerHandle {
            shutdown: shutdown_tx,
            task,
        })
    }

    async fn subscribe(&self) -> NotificationResult<Subscription> {
        let subscription = self.bus.subscribe(&EventType::subjects()).await?;
        info!(
            subjects = ?subscription.subjects(),
            "Notification consumer subscribed"
        );
        Ok(subscription)
    }

    async fn drain(
        &self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> StopReason {
        let reason = loop {
            if *shutdown.borrow() {
                break StopReason::Cancelled;
            }

            // Cancellation wins over a ready message; the current message is
            // always finished before the signal is checked again.
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break StopReason::Cancelled;
                    }
                }
                message = subscription.recv() => match message {
                    Some(message) => self.dispatch(&message).await,
                    None => break StopReason::SubscriptionClosed,
                },
            }
        };

        subscription.unsubscribe();
        info!(reason = ?reason, "Notification consumer stopped");
        reason
    }

    /// Handle one message and log its failure, if any.
    async fn dispatch(&self, message: &BusMessage) {
        let started = Instant::now();
        self.metrics.message_received(&message.subject);

        match self.process(message).await {
            Ok(handled) => {
                debug!(
                    subject = %message.subject,
                    intents = handled.intents,
                    persisted = handled.persisted,
                    emails = handled.emails,
                    "Message handled"
                );
            }
            Err(e) => {
                match e.kind() {
                    "decode" | "routing" => warn!(
                        subject = %message.subject,
                        kind = e.kind(),
                        error = %e,
                        "Dropping message"
                    ),
                    _ => error!(
                        subject = %message.subject,
                        kind = e.kind(),
                        error = %e,
                        "Failed to handle message"
                    ),
                }
                self.metrics.message_failed(&message.subject, e.kind());
            }
        }

        self.metrics
            .message_handled(&message.subject, started.elapsed());
    }

    /// Decode, route and handle a single bus message.
    ///
    /// Store failures for individual intents are logged and counted, not
    /// returned; the remaining intents are still written.
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn process(&self, message: &BusMessage) -> NotificationResult<Handled> {
        let event = Event::from_slice(&message.payload)?;
        let event_type = event.kind()?;

        match event_type.route() {
            Route::Rules => self.handle_rules(&message.subject, &event).await,
            Route::Email => self.handle_email(event_type, &event).await,
        }
    }

    async fn handle_rules(&self, subject: &str, event: &Event) -> NotificationResult<Handled> {
        let intents = self.engine.evaluate(event).await?;
        let mut handled = Handled {
            intents: intents.len(),
            ..Handled::default()
        };

        for intent in intents {
            let (recipient_id, entity_id) = (intent.recipient_id, intent.entity_id);
            let notification = match self.store.create(intent).await {
                Ok(notification) => notification,
                Err(e) => {
                    error!(
                        event_type = %event.event_type,
                        entity_id = %entity_id,
                        recipient_id = %recipient_id,
                        error = %e,
                        "Failed to persist notification"
                    );
                    self.metrics.message_failed(subject, e.kind());
                    continue;
                }
            };

            handled.persisted += 1;
            self.metrics
                .notification_created(notification.notification_type);

            if let Some(push) = &self.push {
                if let Err(e) = push.push(&notification).await {
                    warn!(
                        notification_id = %notification.id,
                        recipient_id = %recipient_id,
                        error = %e,
                        "Failed to push notification"
                    );
                }
            }
        }

        Ok(handled)
    }

    async fn handle_email(
        &self,
        event_type: EventType,
        event: &Event,
    ) -> NotificationResult<Handled> {
        let email = self.composer.compose(event_type, event)?;
        let template = email.template.as_ref();

        self.mailer
            .send_templated(&email.recipients, template, &email.subject, &email.data)
            .await?;

        self.metrics.email_sent(template);
        debug!(
            template,
            mailer = self.mailer.name(),
            recipients = email.recipients.len(),
            "Email sent"
        );

        Ok(Handled {
            emails: 1,
            ..Handled::default()
        })
    }
}

/// A running consumer started by [`NotificationConsumer::spawn`].
pub struct ConsumerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<StopReason>,
}

impl ConsumerHandle {
    /// Signal cancellation and wait for the in-flight message to finish.
    pub async fn shutdown(self) -> NotificationResult<StopReason> {
        let _ = self.shutdown.send(true);
        self.join().await
    }

    /// Wait for the loop to stop on its own.
    pub async fn join(self) -> NotificationResult<StopReason> {
        let Self { shutdown, task } = self;
        let result = task
            .await
            .map_err(|e| NotificationError::Internal(format!("Consumer task failed: {}", e)));
        drop(shutdown);
        result
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
