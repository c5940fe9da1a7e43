//! Pub/sub messaging abstractions.
//!
//! This crate is the event-bus seam of the notifier: producers publish opaque
//! byte payloads on a subject, consumers subscribe to a fixed set of subjects
//! and drain **one** merged channel.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  publish(subject, bytes)  ┌──────────────────┐
//! │  Producer  │──────────────────────────▶│    MessageBus    │
//! └────────────┘                           │ (NATS / memory)  │
//!                                          └────────┬─────────┘
//!                                 subscribe([..])   │ one forwarder per subject
//!                                                   ▼
//!                                          ┌──────────────────┐
//!                                          │   Subscription   │  ← single mpsc channel
//!                                          └──────────────────┘
//! ```
//!
//! # Delivery guarantees
//!
//! Delivery is at-most-once and fire-and-forget, matching NATS core pub/sub:
//! there is no acknowledgement, redelivery or dead-letter queue. A subscriber
//! that is slow enough to fill its buffer loses messages (the in-memory bus
//! logs each drop). Publish order from a single publisher is preserved per
//! subscription.
//!
//! # Features
//!
//! - `nats`: enables [`NatsBus`], backed by `async-nats` core subjects.

mod bus;
mod error;
mod memory;
mod message;
#[cfg(feature = "nats")]
mod nats;

pub use bus::{MessageBus, Subscription, DEFAULT_SUBSCRIPTION_BUFFER};
pub use error::{BusError, BusResult};
pub use memory::InMemoryBus;
pub use message::Message;
#[cfg(feature = "nats")]
pub use nats::NatsBus;
