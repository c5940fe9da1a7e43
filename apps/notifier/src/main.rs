//! Notifier service
//!
//! Binary entry point for the notification pipeline.

#[tokio::main]
async fn main() {
    if let Err(e) = zerg_notifier::run().await {
        eprintln!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}
