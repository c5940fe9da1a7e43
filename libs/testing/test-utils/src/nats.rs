//! NATS test infrastructure
//!
//! Provides a `TestNats` helper that runs a plain NATS server (core pub/sub,
//! no JetStream) in a container.

use async_nats::Client;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::nats::Nats;

// Re-export for test convenience (used by consumers of this crate)
#[allow(unused_imports)]
pub use futures::StreamExt;

/// Test NATS wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// ```no_run
/// use test_utils::TestNats;
///
/// # async fn example() {
/// let nats = TestNats::new().await;
/// let url = nats.connection_string();
/// # }
/// ```
pub struct TestNats {
    #[allow(dead_code)]
    container: ContainerAsync<Nats>,
    client: Client,
    pub connection_string: String,
}

impl TestNats {
    pub async fn new() -> Self {
        let container = Nats::default()
            .with_tag("latest")
            .start()
            .await
            .expect("Failed to start NATS container");

        let host_port = container
            .get_host_port_ipv4(4222)
            .await
            .expect("Failed to get NATS port");

        let connection_string = format!("nats://127.0.0.1:{}", host_port);

        let client = async_nats::connect(&connection_string)
            .await
            .expect("Failed to connect to NATS");

        tracing::info!(port = host_port, "Test NATS ready");

        Self {
            container,
            client,
            connection_string,
        }
    }

    /// Get a cloned client (useful for publishing fixtures)
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Get the connection string for manual client creation
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Drop for TestNats {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test NATS container");
    }
}
