//! Cron-based scheduler for periodic signal checks

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StrategyError;
use crate::notifications::SignalNotifier;
use crate::services::signal_service::SignalService;

/// Cron expression firing every `interval_seconds`.
///
/// The interval must divide a minute, an hour or a day evenly (30s, 15m, 4h,
/// 24h, ...). Other intervals cannot be expressed as a single cron step and
/// are rejected.
pub fn cron_expression(interval_seconds: u64) -> Result<String, StrategyError> {
    let unsupported = || {
        StrategyError::InvalidConfiguration(format!(
            "Scheduler interval {}s must evenly divide a minute, an hour or a day",
            interval_seconds
        ))
    };

    match interval_seconds {
        0 => Err(StrategyError::InvalidConfiguration(
            "Scheduler disabled: interval_seconds is 0".to_string(),
        )),
        86_400 => Ok("0 0 0 * * *".to_string()),
        s if s % 3600 == 0 => {
            let hours = s / 3600;
            if 24 % hours == 0 {
                Ok(format!("0 0 */{} * * *", hours))
            } else {
                Err(unsupported())
            }
        }
        s if s % 60 == 0 => {
            let minutes = s / 60;
            if 60 % minutes == 0 {
                Ok(format!("0 */{} * * * *", minutes))
            } else {
                Err(unsupported())
            }
        }
        s if s < 60 && 60 % s == 0 => Ok(format!("*/{} * * * * *", s)),
        _ => Err(unsupported()),
    }
}

/// Scheduler that periodically checks every timeframe for new signals
pub struct SignalScheduler {
    service: Arc<SignalService>,
    notifier: Arc<dyn SignalNotifier>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl SignalScheduler {
    pub fn new(
        service: Arc<SignalService>,
        notifier: Arc<dyn SignalNotifier>,
        interval_seconds: u64,
    ) -> Result<Self, StrategyError> {
        let cron_expr = cron_expression(interval_seconds)?;
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            StrategyError::InvalidConfiguration(format!(
                "Invalid cron expression '{}': {}",
                cron_expr, e
            ))
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "SignalScheduler: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            service,
            notifier,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) {
        let service = self.service.clone();
        let notifier = self.notifier.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("SignalScheduler: started, waiting for cron schedule...");

            loop {
                match schedule.upcoming(chrono::Utc).next() {
                    Some(next_tick) => {
                        let now = chrono::Utc::now();
                        if next_tick > now {
                            let duration = (next_tick - now).to_std().unwrap_or_default();
                            tokio::time::sleep(duration).await;
                        }
                    }
                    None => {
                        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                        continue;
                    }
                }

                debug!("SignalScheduler: cron tick, checking signals");
                let summary = service.check_signals(notifier.as_ref()).await;
                info!(
                    timeframes = summary.timeframes.len(),
                    new_signals = summary.new_signals,
                    "SignalScheduler: checked {} timeframes, {} new signals",
                    summary.timeframes.len(),
                    summary.new_signals
                );
            }
        });

        *self.handle.write().await = Some(handle);
        info!("SignalScheduler: started successfully");
    }

    pub async fn stop(&self) {
        if let Some(h) = self.handle.write().await.take() {
            h.abort();
            info!("SignalScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
