//! OHLCV bars and the timeframes they are stored under

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StrategyError;

/// One OHLCV sample. Immutable once produced by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Epoch milliseconds, the time format chart clients expect
    pub fn time_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::OneHour, Timeframe::FourHour, Timeframe::OneDay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "1h",
            Timeframe::FourHour => "4h",
            Timeframe::OneDay => "1d",
        }
    }

    pub fn interval_hours(&self) -> i64 {
        match self {
            Timeframe::OneHour => 1,
            Timeframe::FourHour => 4,
            Timeframe::OneDay => 24,
        }
    }

    /// Symbol under which bars of this timeframe are stored.
    ///
    /// Hourly bars live under the base symbol; 4h and daily bars are
    /// pre-aggregated into their own series.
    pub fn storage_symbol(&self, base_symbol: &str) -> String {
        match self {
            Timeframe::OneHour => base_symbol.to_string(),
            Timeframe::FourHour => format!("{}_4H", base_symbol),
            Timeframe::OneDay => format!("{}_DAILY", base_symbol),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Timeframe::OneHour),
            "4h" => Ok(Timeframe::FourHour),
            "1d" => Ok(Timeframe::OneDay),
            _ => Err(StrategyError::UnknownTimeframe(s.to_string())),
        }
    }
}
