//! Signal, position and reporting models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::bar::{Bar, Timeframe};

/// The strategy's stance, carried bar to bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Flat => "flat",
            Position::Long => "long",
            Position::Short => "short",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bar decision emitted by the position state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalEvent {
    #[default]
    Hold,
    LongEntry,
    LongExit,
    ShortEntry,
    ShortExit,
}

impl SignalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalEvent::Hold => "hold",
            SignalEvent::LongEntry => "long_entry",
            SignalEvent::LongExit => "long_exit",
            SignalEvent::ShortEntry => "short_entry",
            SignalEvent::ShortExit => "short_exit",
        }
    }

    /// Strength attached to the event: +1 bullish, -1 bearish, 0 for hold
    pub fn strength(&self) -> f64 {
        match self {
            SignalEvent::LongEntry | SignalEvent::ShortExit => 1.0,
            SignalEvent::ShortEntry | SignalEvent::LongExit => -1.0,
            SignalEvent::Hold => 0.0,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, SignalEvent::Hold)
    }

    pub fn is_long_side(&self) -> bool {
        matches!(self, SignalEvent::LongEntry | SignalEvent::LongExit)
    }

    pub fn is_short_side(&self) -> bool {
        matches!(self, SignalEvent::ShortEntry | SignalEvent::ShortExit)
    }
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bar annotated with the engine's indicators and decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSignal {
    #[serde(flatten)]
    pub bar: Bar,
    pub hull: Option<f64>,
    pub trend: Option<f64>,
    pub hull_shifted: Option<f64>,
    pub trend_shifted: Option<f64>,
    pub signal: SignalEvent,
    pub position: Position,
    pub signal_strength: f64,
}

impl BarSignal {
    /// A bar with no indicators: flat, hold, zero strength
    pub fn price_only(bar: Bar) -> Self {
        Self {
            bar,
            hull: None,
            trend: None,
            hull_shifted: None,
            trend_shifted: None,
            signal: SignalEvent::Hold,
            position: Position::Flat,
            signal_strength: 0.0,
        }
    }
}

/// Latest-bar report used by the API and alerting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub current_position: Position,
    pub last_signal: Option<SignalEvent>,
    pub last_signal_time: Option<DateTime<Utc>>,
    pub hull_value: Option<f64>,
    pub trend_value: Option<f64>,
    pub hull_shifted: Option<f64>,
    pub trend_shifted: Option<f64>,
    pub close_price: f64,
    pub volume: f64,
    pub is_new_signal: bool,
    pub signal_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub hull: Option<f64>,
    pub trend: Option<f64>,
    pub hull_shifted: Option<f64>,
    pub signal: SignalEvent,
    pub position: Position,
    pub signal_strength: f64,
}

impl From<&BarSignal> for ChartBar {
    fn from(row: &BarSignal) -> Self {
        Self {
            time: row.bar.time_millis(),
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            hull: row.hull,
            trend: row.trend,
            hull_shifted: row.hull_shifted,
            signal: row.signal,
            position: row.position,
            signal_strength: row.signal_strength,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartIndicators {
    pub hull_length: usize,
    pub trend_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub data: Vec<ChartBar>,
    pub indicators: ChartIndicators,
    pub warning: Option<String>,
}
