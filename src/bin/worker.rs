//! Hull Trend Worker
//!
//! Periodically checks every timeframe for new signals and sends alerts.
//! Runs as a separate process from the API server.

use backon::{ExponentialBuilder, Retryable};
use dotenvy::dotenv;
use hulltrend::config::{self, Config};
use hulltrend::core::scheduler::SignalScheduler;
use hulltrend::db::OhlcvDatabase;
use hulltrend::logging;
use hulltrend::metrics::Metrics;
use hulltrend::notifications::{DiscordNotifier, SignalNotifier};
use hulltrend::services::{SeriesProvider, SignalService};
use hulltrend::signals::SignalEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let config = Config::from_env()?;
    info!("Starting Hull Trend Worker");
    info!(environment = %config::get_environment(), "Environment");
    info!(
        interval = config.check_interval_seconds,
        "Signal checks: every {} seconds", config.check_interval_seconds
    );

    let engine = SignalEngine::new(config.engine)?;
    let metrics = Arc::new(Metrics::new()?);

    let database_url = config.database_url.clone();
    let database = (|| OhlcvDatabase::connect(&database_url))
        .retry(ExponentialBuilder::default().with_max_times(5))
        .notify(|e, delay: Duration| {
            warn!(error = %e, delay_ms = delay.as_millis() as u64, "Database connection failed, retrying");
        })
        .await?;
    metrics.database_connected.set(1.0);

    let provider: Arc<dyn SeriesProvider> = Arc::new(database);
    let service = Arc::new(
        SignalService::new(provider, engine, &config.base_symbol).with_metrics(metrics),
    );
    let notifier: Arc<dyn SignalNotifier> =
        Arc::new(DiscordNotifier::new(config.discord_webhook_url.clone()));

    // Startup check; a non-hold latest bar is alerted right away
    let summary = service.check_signals(notifier.as_ref()).await;
    info!(
        timeframes = summary.timeframes.len(),
        new_signals = summary.new_signals,
        "Initial signal check complete"
    );

    let scheduler = SignalScheduler::new(service, notifier, config.check_interval_seconds)?;
    scheduler.start().await;

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;
    info!("Shutting down worker...");
    scheduler.stop().await;
    info!("Worker stopped");

    Ok(())
}
