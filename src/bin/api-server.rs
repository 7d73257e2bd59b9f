//! Hull Trend API Server
//!
//! Serves current signals, chart data and raw OHLCV bars over HTTP.

use backon::{ExponentialBuilder, Retryable};
use dotenvy::dotenv;
use hulltrend::config::{self, Config};
use hulltrend::core::http::start_server;
use hulltrend::db::OhlcvDatabase;
use hulltrend::logging;
use hulltrend::metrics::Metrics;
use hulltrend::notifications::{DiscordNotifier, SignalNotifier};
use hulltrend::services::{SeriesProvider, SignalService};
use hulltrend::signals::SignalEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let config = Config::from_env()?;
    info!("Starting Hull Trend API Server");
    info!(environment = %config::get_environment(), "Environment");
    info!(
        hull_length = config.engine.hull_length,
        trend_length = config.engine.trend_length,
        symbol = %config.base_symbol,
        "Strategy: HULL={}, TREND={}",
        config.engine.hull_length,
        config.engine.trend_length
    );

    let engine = SignalEngine::new(config.engine)?;
    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing database connection...");
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
        SignalService::new(provider, engine, &config.base_symbol).with_metrics(metrics.clone()),
    );
    let notifier: Arc<dyn SignalNotifier> =
        Arc::new(DiscordNotifier::new(config.discord_webhook_url.clone()));

    let port = config.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, metrics, service, notifier).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
