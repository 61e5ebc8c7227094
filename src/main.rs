use anyhow::{Context, Result};
use rainwatch_core::AlertConfig;
use rainwatch_services::{provider_for, Notifier, Scheduler};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    rainwatch_core::init();

    let config = AlertConfig::load_validated().map_err(|e| {
        tracing::error!("{} {}", e, e.user_message());
        e
    })?;

    let provider = provider_for(&config).context("Failed to create forecast provider")?;
    let notifier =
        Notifier::new(config.notify_endpoint.clone()).context("Failed to create notifier")?;
    let scheduler = Scheduler::new(&config, provider, notifier);

    // Ctrl-C is the only way out of the loop.
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                shutdown.cancel();
            }
        }
    });

    tracing::info!("rainwatch started");
    scheduler.run(shutdown).await;

    Ok(())
}
