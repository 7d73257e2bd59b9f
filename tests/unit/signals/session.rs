//! Unit tests for session tracking

use chrono::{DateTime, Duration, TimeZone, Utc};
use hulltrend::models::{Bar, BarSignal, Position, SignalEvent, Timeframe};
use hulltrend::signals::session::SessionState;

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn bar_signal(hour: i64, signal: SignalEvent, position: Position) -> BarSignal {
    BarSignal {
        bar: Bar::new(100.0, 101.0, 99.0, 100.5, 250.0, at(hour)),
        hull: Some(100.2),
        trend: Some(99.8),
        hull_shifted: Some(100.0),
        trend_shifted: Some(99.7),
        signal,
        position,
        signal_strength: signal.strength(),
    }
}

#[test]
fn test_new_session_is_flat_and_empty() {
    let state = SessionState::new();
    assert_eq!(state.current_position, Position::Flat);
    assert_eq!(state.last_signal, None);
    assert_eq!(state.last_signal_time, None);
}

#[test]
fn test_first_non_hold_is_new() {
    let state = SessionState::new();
    let latest = bar_signal(5, SignalEvent::LongEntry, Position::Long);
    assert!(state.is_new_event(&latest));

    let (next, is_new) = state.observe(&latest);
    assert!(is_new);
    assert_eq!(next.current_position, Position::Long);
    assert_eq!(next.last_signal, Some(SignalEvent::LongEntry));
    assert_eq!(next.last_signal_time, Some(at(5)));
}

#[test]
fn test_same_timestamp_is_not_new_twice() {
    let latest = bar_signal(5, SignalEvent::LongEntry, Position::Long);
    let (after_first, _) = SessionState::new().observe(&latest);
    let (after_second, is_new) = after_first.observe(&latest);
    assert!(!is_new);
    assert_eq!(after_second, after_first);
}

#[test]
fn test_hold_is_never_new() {
    let latest = bar_signal(5, SignalEvent::Hold, Position::Flat);
    let (next, is_new) = SessionState::new().observe(&latest);
    assert!(!is_new);
    assert_eq!(next.last_signal, None);
    assert_eq!(next.last_signal_time, None);
}

#[test]
fn test_later_signal_is_new() {
    let (state, _) = SessionState::new().observe(&bar_signal(5, SignalEvent::LongEntry, Position::Long));
    let (state, is_new) = state.observe(&bar_signal(6, SignalEvent::Hold, Position::Long));
    assert!(!is_new);
    assert_eq!(state.last_signal_time, Some(at(5)));

    let (state, is_new) = state.observe(&bar_signal(9, SignalEvent::LongExit, Position::Flat));
    assert!(is_new);
    assert_eq!(state.last_signal, Some(SignalEvent::LongExit));
    assert_eq!(state.last_signal_time, Some(at(9)));
    assert_eq!(state.current_position, Position::Flat);
}

#[test]
fn test_earlier_signal_is_not_new() {
    let (state, _) = SessionState::new().observe(&bar_signal(9, SignalEvent::ShortEntry, Position::Short));
    let (state, is_new) = state.observe(&bar_signal(4, SignalEvent::LongEntry, Position::Long));
    assert!(!is_new);
    assert_eq!(state.last_signal, Some(SignalEvent::ShortEntry));
}

#[test]
fn test_position_follows_latest_bar() {
    let (state, _) = SessionState::new().observe(&bar_signal(5, SignalEvent::LongEntry, Position::Long));
    let (state, _) = state.observe(&bar_signal(5, SignalEvent::Hold, Position::Short));
    assert_eq!(state.current_position, Position::Short);
}

#[test]
fn test_snapshot_reports_latest_bar() {
    let latest = bar_signal(7, SignalEvent::ShortEntry, Position::Short);
    let (state, is_new) = SessionState::new().observe(&latest);
    let snapshot = state.snapshot(&latest, is_new, "BTC", Timeframe::FourHour);

    assert_eq!(snapshot.timestamp, at(7));
    assert_eq!(snapshot.symbol, "BTC");
    assert_eq!(snapshot.timeframe, Timeframe::FourHour);
    assert_eq!(snapshot.current_position, Position::Short);
    assert_eq!(snapshot.last_signal, Some(SignalEvent::ShortEntry));
    assert_eq!(snapshot.hull_value, Some(100.2));
    assert_eq!(snapshot.trend_value, Some(99.8));
    assert_eq!(snapshot.close_price, 100.5);
    assert_eq!(snapshot.volume, 250.0);
    assert!(snapshot.is_new_signal);
    assert_eq!(snapshot.signal_strength, -1.0);
}

#[test]
fn test_snapshot_serializes_lowercase_enums() {
    let latest = bar_signal(7, SignalEvent::LongEntry, Position::Long);
    let (state, is_new) = SessionState::new().observe(&latest);
    let json = serde_json::to_value(state.snapshot(&latest, is_new, "BTC", Timeframe::OneHour)).unwrap();

    assert_eq!(json["current_position"], "long");
    assert_eq!(json["last_signal"], "long_entry");
    assert_eq!(json["timeframe"], "1h");
    assert_eq!(json["is_new_signal"], true);
}
