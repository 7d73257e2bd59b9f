//! Hull/Trend signal engine.
//!
//! Two Hull moving averages drive a long/short/flat state machine: the fast
//! "hull" line compared against itself two bars back, and the slow "trend"
//! line compared against itself one bar back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StrategyError;
use crate::indicators::trend::{calculate_hma, close_series};
use crate::models::{Bar, BarSignal, Position, SignalEvent};
use crate::signals::session::SessionState;

pub const DEFAULT_HULL_LENGTH: usize = 220;
pub const DEFAULT_TREND_LENGTH: usize = 1000;

/// Bars of lag for the hull comparison (`hull[i]` vs `hull[i-2]`)
pub const HULL_SHIFT: usize = 2;
/// Bars of lag for the trend comparison (`trend[i]` vs `trend[i-1]`)
pub const TREND_SHIFT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub hull_length: usize,
    pub trend_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hull_length: DEFAULT_HULL_LENGTH,
            trend_length: DEFAULT_TREND_LENGTH,
        }
    }
}

/// Indicator columns for a series, index-aligned with its bars
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub hull: Vec<Option<f64>>,
    pub trend: Vec<Option<f64>>,
    pub hull_shifted: Vec<Option<f64>>,
    pub trend_shifted: Vec<Option<f64>>,
}

/// Result of one engine step over a series
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub state: SessionState,
    pub signals: Vec<BarSignal>,
    pub is_new_signal: bool,
}

impl StepOutput {
    pub fn latest(&self) -> Option<&BarSignal> {
        self.signals.last()
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
}

impl SignalEngine {
    /// Build an engine, rejecting non-positive lengths.
    ///
    /// A trend line faster than the hull line is accepted but logged.
    pub fn new(config: EngineConfig) -> Result<Self, StrategyError> {
        if config.hull_length == 0 {
            return Err(StrategyError::InvalidConfiguration(
                "hull_length must be a positive integer".to_string(),
            ));
        }
        if config.trend_length == 0 {
            return Err(StrategyError::InvalidConfiguration(
                "trend_length must be a positive integer".to_string(),
            ));
        }
        if config.trend_length < config.hull_length {
            warn!(
                hull_length = config.hull_length,
                trend_length = config.trend_length,
                "trend_length is shorter than hull_length; the trend filter will be faster than the signal line"
            );
        }

        debug!(
            hull_length = config.hull_length,
            trend_length = config.trend_length,
            "Signal engine initialized"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a series of `len` bars is long enough for full indicators
    pub fn has_sufficient_history(&self, len: usize) -> bool {
        len >= self.config.trend_length
    }

    pub fn compute_indicators(&self, bars: &[Bar]) -> IndicatorSeries {
        let closes = close_series(bars);
        let hull = calculate_hma(&closes, self.config.hull_length);
        let trend = calculate_hma(&closes, self.config.trend_length);
        let hull_shifted = shift(&hull, HULL_SHIFT);
        let trend_shifted = shift(&trend, TREND_SHIFT);

        IndicatorSeries {
            hull,
            trend,
            hull_shifted,
            trend_shifted,
        }
    }

    /// Walk the series once from a flat position, producing one decision per bar.
    ///
    /// Short series are not an error: their indicators stay `None` and every
    /// bar holds flat.
    pub fn evaluate(&self, bars: &[Bar]) -> Vec<BarSignal> {
        let indicators = self.compute_indicators(bars);
        let mut signals = Vec::with_capacity(bars.len());
        let mut prev = Position::Flat;

        for (i, bar) in bars.iter().enumerate() {
            let hull = indicators.hull[i];
            let trend = indicators.trend[i];
            let hull_shifted = indicators.hull_shifted[i];
            let trend_shifted = indicators.trend_shifted[i];

            let (position, signal) = if i == 0 {
                (Position::Flat, SignalEvent::Hold)
            } else {
                match (hull, trend, hull_shifted, trend_shifted) {
                    (Some(h), Some(t), Some(hs), Some(ts)) => next_position(prev, h, t, hs, ts),
                    _ => (prev, SignalEvent::Hold),
                }
            };

            signals.push(BarSignal {
                bar: *bar,
                hull,
                trend,
                hull_shifted,
                trend_shifted,
                signal,
                position,
                signal_strength: signal.strength(),
            });
            prev = position;
        }

        debug!(
            bars = bars.len(),
            final_position = %prev,
            "Series evaluated"
        );
        signals
    }

    /// Evaluate a series against a prior session state.
    ///
    /// Pure: the prior state is only read and the successor is returned.
    /// Returns `None` for an empty series.
    pub fn step(&self, bars: &[Bar], prior: &SessionState) -> Option<StepOutput> {
        if bars.is_empty() {
            return None;
        }

        let signals = self.evaluate(bars);
        let latest = signals.last()?;
        let (state, is_new_signal) = prior.observe(latest);

        Some(StepOutput {
            state,
            signals,
            is_new_signal,
        })
    }
}

/// Apply the transition rules for one bar with fully defined indicators.
///
/// Rules are tried in order and the first match wins:
/// 1. long agreement while not long -> long entry
/// 2. short agreement while not short -> short entry
/// 3. long and hull turning down -> long exit
/// 4. short and hull turning up -> short exit
/// 5. otherwise hold
pub fn next_position(
    prev: Position,
    hull: f64,
    trend: f64,
    hull_shifted: f64,
    trend_shifted: f64,
) -> (Position, SignalEvent) {
    let hull_up = hull > hull_shifted;
    let hull_down = hull < hull_shifted;
    let trend_up = trend > trend_shifted;
    let trend_down = trend < trend_shifted;

    let long_agree = trend_up && hull_up;
    let short_agree = trend_down && hull_down;

    if long_agree && prev != Position::Long {
        (Position::Long, SignalEvent::LongEntry)
    } else if short_agree && prev != Position::Short {
        (Position::Short, SignalEvent::ShortEntry)
    } else if prev == Position::Long && hull_down {
        (Position::Flat, SignalEvent::LongExit)
    } else if prev == Position::Short && hull_up {
        (Position::Flat, SignalEvent::ShortExit)
    } else {
        (prev, SignalEvent::Hold)
    }
}

/// Lag a series by `lag` bars, padding the front with `None`
pub fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    let pad = lag.min(values.len());
    let mut out = vec![None; pad];
    out.extend_from_slice(&values[..values.len() - pad]);
    out
}
