//! Shared test utilities for the notifier crates
//!
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `TestNats`: NATS container with automatic cleanup (feature: "nats")
//!
//! # Usage
//!
//! ```
//! use test_utils::TestDataBuilder;
//!
//! let builder = TestDataBuilder::from_test_name("reassignment");
//! let actor = builder.id("actor");
//! let assignee = builder.id("assignee");
//! assert_ne!(actor, assignee);
//! ```
//!
//! ## NATS Testing
//!
//! Add `features = ["nats"]` to your dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["nats"] }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

#[cfg(feature = "nats")]
mod nats;

#[cfg(feature = "nats")]
pub use nats::TestNats;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by deriving every value from a seed.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_comment_on_story");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a stable ID for a named role within the test
    ///
    /// The same label always yields the same ID for a given seed; different
    /// labels yield different IDs.
    pub fn id(&self, label: &str) -> Uuid {
        let mut high = DefaultHasher::new();
        (self.seed, label, 0u8).hash(&mut high);
        let mut low = DefaultHasher::new();
        (self.seed, label, 1u8).hash(&mut low);

        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&high.finish().to_le_bytes());
        uuid_bytes[8..].copy_from_slice(&low.finish().to_le_bytes());
        Uuid::from_bytes(uuid_bytes)
    }

}
