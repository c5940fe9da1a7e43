//! Notifier service
//!
//! Long-running consumer that turns project-tracking events into in-app
//! notifications and transactional emails.
//!
//! ## Architecture
//!
//! ```text
//! NATS core subjects (story.*, comment.*, objective.*, workspace.* ...)
//!   ↓ (one merged subscription, optional queue group)
//! NotificationConsumer
//!   ├─ RuleEngine → NotificationStore → PushHub
//!   └─ EmailComposer → SmtpMailer (Handlebars + lettre)
//! ```
//!
//! Delivery is at-most-once: NATS core has no redelivery, and a message lost
//! in flight is not retried. Run several instances with the same
//! `NATS_QUEUE_GROUP` to share the load.

pub mod config;

use config::NotifierConfig;
use core_config::{Environment, FromEnv};
use domain_notifications::{
    BroadcastPushHub, EmailComposer, InMemoryDirectory, InMemoryNotificationStore,
    NotificationConsumer, NotificationResult, RuleEngine, SmtpMailer, StopReason, TemplateEngine,
};
use eyre::{Result, WrapErr};
use messaging::NatsBus;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Run the notifier until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the metrics endpoint cannot
/// bind, NATS is unreachable, or the subscription fails.
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();

    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let config = NotifierConfig::from_env().wrap_err("Failed to load notifier configuration")?;
    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        environment = ?environment,
        "Starting notifier service"
    );

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .wrap_err_with(|| format!("Failed to start metrics endpoint on {}", metrics_addr))?;
    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");

    info!(url = %config.nats.url, queue_group = ?config.nats.queue_group, "Connecting to NATS...");
    let bus = NatsBus::connect_with_options(&config.nats.url, &config.nats.client_name)
        .await
        .wrap_err_with(|| format!("Failed to connect to NATS at {}", config.nats.url))?
        .with_queue_group(config.nats.queue_group.clone())
        .with_buffer(config.subscription_buffer);
    info!("Connected to NATS successfully");

    let templates = TemplateEngine::new().wrap_err("Failed to initialize email templates")?;
    let mailer = SmtpMailer::new(config.smtp.clone(), templates)
        .wrap_err("Failed to create SMTP mailer")?;
    match smtp_health_problem(mailer.health_check().await) {
        None => info!(host = %config.smtp.host, "SMTP server reachable"),
        Some(problem) => warn!(
            host = %config.smtp.host,
            problem = %problem,
            "SMTP server not usable, emails will fail until it is"
        ),
    }

    // Local wiring. Deployments replace these with database-backed sinks.
    let store = InMemoryNotificationStore::with_capacity(config.store_capacity);
    let lookups = InMemoryDirectory::new();
    let push = BroadcastPushHub::default();
    info!(capacity = store.capacity(), "Using in-memory notification store");
    warn!(
        "Using an empty stand-in directory: story assignees are unknown, so comment \
         notifications are skipped and titles use fallbacks"
    );

    let consumer = NotificationConsumer::new(
        Arc::new(bus),
        RuleEngine::new(Arc::new(lookups)),
        Arc::new(store),
        Arc::new(mailer),
        EmailComposer::new(config.frontend_url.clone(), config.company_name.clone()),
    )
    .with_push(Arc::new(push));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {:?}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    info!("Notification consumer running");
    let reason = consumer
        .run(shutdown_rx)
        .await
        .wrap_err("Failed to subscribe to notification events")?;

    match reason {
        StopReason::Cancelled => info!("Notifier service stopped"),
        StopReason::SubscriptionClosed => {
            warn!("NATS subscription closed, notifier service stopped")
        }
    }
    Ok(())
}

/// Describe what is wrong with an SMTP health check result, if anything.
fn smtp_health_problem(result: NotificationResult<bool>) -> Option<String> {
    match result {
        Ok(true) => None,
        Ok(false) => Some("connection test returned false".to_string()),
        Err(e) => Some(e.to_string()),
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .wrap_err("Failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), eyre::Report>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Received Ctrl+C, initiating shutdown...");
        },
        result = terminate => {
            result?;
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}
