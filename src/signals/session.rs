//! Session memory carried between evaluations of the same symbol/timeframe.
//!
//! The state is a plain value owned by the caller. Evaluations read the prior
//! state and hand back its successor, so two callers never share hidden
//! mutable fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BarSignal, Position, SignalEvent, SignalSnapshot, Timeframe};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub current_position: Position,
    pub last_signal: Option<SignalEvent>,
    pub last_signal_time: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `latest` is an event not yet recorded in this session.
    ///
    /// New means: strictly later than the last recorded signal (or nothing
    /// recorded yet) and not a hold.
    pub fn is_new_event(&self, latest: &BarSignal) -> bool {
        let is_later = self
            .last_signal_time
            .map_or(true, |recorded| latest.bar.timestamp > recorded);
        is_later && !latest.signal.is_hold()
    }

    /// Fold the latest bar into the session, returning the successor state
    /// and whether the bar was a new event.
    pub fn observe(&self, latest: &BarSignal) -> (SessionState, bool) {
        let is_new = self.is_new_event(latest);
        let mut next = self.clone();
        next.current_position = latest.position;
        if is_new {
            next.last_signal = Some(latest.signal);
            next.last_signal_time = Some(latest.bar.timestamp);
        }
        (next, is_new)
    }

    /// Build the external report for `latest` from this (already updated) state
    pub fn snapshot(
        &self,
        latest: &BarSignal,
        is_new_signal: bool,
        symbol: &str,
        timeframe: Timeframe,
    ) -> SignalSnapshot {
        SignalSnapshot {
            timestamp: latest.bar.timestamp,
            symbol: symbol.to_string(),
            timeframe,
            current_position: self.current_position,
            last_signal: self.last_signal,
            last_signal_time: self.last_signal_time,
            hull_value: latest.hull,
            trend_value: latest.trend,
            hull_shifted: latest.hull_shifted,
            trend_shifted: latest.trend_shifted,
            close_price: latest.bar.close,
            volume: latest.bar.volume,
            is_new_signal,
            signal_strength: latest.signal_strength,
        }
    }
}
