//! Signal service: loads series, runs the engine, tracks sessions and alerts.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::StrategyError;
use crate::metrics::Metrics;
use crate::models::{Bar, ChartData, SignalEvent, SignalSnapshot, Timeframe};
use crate::notifications::SignalNotifier;
use crate::services::market_data::SeriesProvider;
use crate::services::resample::resample_4h;
use crate::signals::chart::{build_chart_data, chart_fetch_limit};
use crate::signals::engine::SignalEngine;
use crate::signals::session::SessionState;

/// Bars loaded when computing the current signal
pub const SNAPSHOT_FETCH_LIMIT: usize = 2000;
/// Hourly bars read when rebuilding the 4h series
pub const RESAMPLE_SOURCE_LIMIT: usize = SNAPSHOT_FETCH_LIMIT * 4;

const FOUR_HOUR_SECS: i64 = 4 * 3600;

type SessionKey = (String, Timeframe);

/// Outcome of checking every timeframe for new signals
#[derive(Debug, Clone, Serialize)]
pub struct SignalCheckSummary {
    pub timeframes: BTreeMap<String, SignalSnapshot>,
    pub new_signals: usize,
}

pub struct SignalService {
    provider: Arc<dyn SeriesProvider>,
    engine: SignalEngine,
    base_symbol: String,
    sessions: Mutex<HashMap<SessionKey, SessionState>>,
    alerted: Mutex<HashMap<SessionKey, SignalEvent>>,
    metrics: Option<Arc<Metrics>>,
}

impl SignalService {
    pub fn new(provider: Arc<dyn SeriesProvider>, engine: SignalEngine, base_symbol: &str) -> Self {
        Self {
            provider,
            engine,
            base_symbol: base_symbol.to_string(),
            sessions: Mutex::new(HashMap::new()),
            alerted: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_symbol(&self) -> &str {
        &self.base_symbol
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// Session state currently recorded for a timeframe
    pub async fn session(&self, timeframe: Timeframe) -> SessionState {
        self.sessions
            .lock()
            .await
            .get(&self.session_key(timeframe))
            .cloned()
            .unwrap_or_default()
    }

    fn session_key(&self, timeframe: Timeframe) -> SessionKey {
        (self.base_symbol.clone(), timeframe)
    }

    async fn load(&self, timeframe: Timeframe, limit: usize) -> Result<Vec<Bar>, StrategyError> {
        let symbol = timeframe.storage_symbol(&self.base_symbol);
        let bars = self.provider.get_series(&symbol, timeframe, limit).await?;
        if bars.is_empty() {
            return Err(StrategyError::no_data(&symbol, timeframe));
        }
        Ok(bars)
    }

    /// Evaluate the latest bar of a timeframe and advance its session.
    ///
    /// The session lock is held for the whole load/evaluate/store sequence,
    /// so concurrent callers on the same service are serialized.
    pub async fn current_signal(&self, timeframe: Timeframe) -> Result<SignalSnapshot, StrategyError> {
        let start = Instant::now();
        let result = self.evaluate_current(timeframe).await;

        if let Some(ref metrics) = self.metrics {
            let outcome = match &result {
                Ok(_) => "ok",
                Err(StrategyError::NoData { .. }) => "no_data",
                Err(_) => "error",
            };
            metrics
                .signal_evaluations_total
                .with_label_values(&[timeframe.as_str(), outcome])
                .inc();
            metrics
                .signal_evaluation_duration_seconds
                .observe(start.elapsed().as_secs_f64());
        }

        result
    }

    async fn evaluate_current(&self, timeframe: Timeframe) -> Result<SignalSnapshot, StrategyError> {
        let key = self.session_key(timeframe);
        let mut sessions = self.sessions.lock().await;

        let bars = self.load(timeframe, SNAPSHOT_FETCH_LIMIT).await?;
        if !self.engine.has_sufficient_history(bars.len()) {
            warn!(
                timeframe = %timeframe,
                need = self.engine.config().trend_length,
                have = bars.len(),
                "Insufficient history for {}; indicators will be empty",
                timeframe
            );
        }

        let prior = sessions.get(&key).cloned().unwrap_or_default();
        let output = self
            .engine
            .step(&bars, &prior)
            .ok_or_else(|| StrategyError::no_data(&timeframe.storage_symbol(&self.base_symbol), timeframe))?;
        let latest = output
            .latest()
            .ok_or_else(|| StrategyError::no_data(&timeframe.storage_symbol(&self.base_symbol), timeframe))?;

        let snapshot = output
            .state
            .snapshot(latest, output.is_new_signal, &self.base_symbol, timeframe);
        sessions.insert(key, output.state.clone());

        debug!(
            timeframe = %timeframe,
            position = %snapshot.current_position,
            signal = %latest.signal,
            is_new = snapshot.is_new_signal,
            "Current signal evaluated"
        );
        Ok(snapshot)
    }

    /// Chart data for the last `limit` bars of a timeframe
    pub async fn strategy_data(
        &self,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<ChartData, StrategyError> {
        let fetch = chart_fetch_limit(limit, self.engine.config().trend_length);
        let bars = self.load(timeframe, fetch).await?;
        Ok(build_chart_data(
            &self.engine,
            &bars,
            &self.base_symbol,
            timeframe,
            limit,
        ))
    }

    /// Raw bars, oldest first
    pub async fn ohlcv(&self, timeframe: Timeframe, limit: usize) -> Result<Vec<Bar>, StrategyError> {
        self.load(timeframe, limit).await
    }

    /// Rebuild the 4h series from the stored hourly bars.
    ///
    /// Returns the number of 4h bars written. When the hourly window is cut
    /// off by the fetch limit, bars before the first 4h boundary are skipped
    /// so a partial bucket never overwrites a complete one.
    pub async fn rebuild_four_hour_series(&self) -> Result<u64, StrategyError> {
        let hourly = self.load(Timeframe::OneHour, RESAMPLE_SOURCE_LIMIT).await?;
        let start = if hourly.len() >= RESAMPLE_SOURCE_LIMIT {
            hourly
                .iter()
                .position(|b| b.timestamp.timestamp().rem_euclid(FOUR_HOUR_SECS) == 0)
                .unwrap_or(hourly.len())
        } else {
            0
        };

        let bars = resample_4h(&hourly[start..]);
        let symbol = Timeframe::FourHour.storage_symbol(&self.base_symbol);
        let written = self
            .provider
            .store_series(&symbol, Timeframe::FourHour, &bars)
            .await?;

        info!(
            symbol = %symbol,
            hourly = hourly.len() - start,
            written = written,
            "Rebuilt {} bars from hourly data",
            symbol
        );
        Ok(written)
    }

    /// Rebuild the 4h series, then evaluate every timeframe and alert on
    /// signals not alerted before.
    ///
    /// A failing timeframe is logged and skipped. Failures other than missing
    /// data are also sent as error alerts.
    pub async fn check_signals(&self, notifier: &dyn SignalNotifier) -> SignalCheckSummary {
        match self.rebuild_four_hour_series().await {
            Ok(_) => {}
            Err(StrategyError::NoData { .. }) => {
                debug!("No hourly data, skipping 4h rebuild");
            }
            Err(e) => {
                warn!(error = %e, "4h rebuild failed");
                let context = format!("4h rebuild failed for {}", self.base_symbol);
                self.send_error_alert(notifier, &e, &context).await;
            }
        }

        let mut timeframes = BTreeMap::new();
        let mut new_signals = 0;

        for timeframe in Timeframe::ALL {
            let snapshot = match self.current_signal(timeframe).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(timeframe = %timeframe, error = %e, "Signal check failed for {}", timeframe);
                    if !matches!(e, StrategyError::NoData { .. }) {
                        let context =
                            format!("Signal check failed for {} ({})", self.base_symbol, timeframe);
                        self.send_error_alert(notifier, &e, &context).await;
                    }
                    continue;
                }
            };

            if snapshot.is_new_signal && self.record_alert(timeframe, snapshot.last_signal).await {
                new_signals += 1;
                info!(
                    timeframe = %timeframe,
                    signal = ?snapshot.last_signal,
                    price = snapshot.close_price,
                    "New {} signal",
                    timeframe
                );
                match notifier.send_signal_alert(&snapshot).await {
                    Ok(true) => {
                        if let Some(ref metrics) = self.metrics {
                            metrics.signal_alerts_total.inc();
                        }
                    }
                    Ok(false) => debug!(timeframe = %timeframe, "Signal alert not delivered"),
                    Err(e) => error!(timeframe = %timeframe, error = %e, "Failed to send signal alert"),
                }
            }

            timeframes.insert(timeframe.as_str().to_string(), snapshot);
        }

        SignalCheckSummary {
            timeframes,
            new_signals,
        }
    }

    async fn send_error_alert(
        &self,
        notifier: &dyn SignalNotifier,
        err: &StrategyError,
        context: &str,
    ) {
        if let Err(e) = notifier.send_error_alert(&err.to_string(), context).await {
            error!(error = %e, context = %context, "Failed to send error alert");
        }
    }

    /// Remember `signal` as alerted; false when it repeats the last alert
    async fn record_alert(&self, timeframe: Timeframe, signal: Option<SignalEvent>) -> bool {
        let Some(signal) = signal else {
            return false;
        };
        let mut alerted = self.alerted.lock().await;
        let key = self.session_key(timeframe);
        if alerted.get(&key) == Some(&signal) {
            return false;
        }
        alerted.insert(key, signal);
        true
    }
}
