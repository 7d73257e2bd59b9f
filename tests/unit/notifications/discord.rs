//! Unit tests for Discord embed formatting

use chrono::{TimeZone, Utc};
use hulltrend::models::{Position, SignalEvent, SignalSnapshot, Timeframe};
use hulltrend::notifications::discord::{format_signal_embed, format_usd};

fn snapshot(signal: Option<SignalEvent>, position: Position) -> SignalSnapshot {
    SignalSnapshot {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        symbol: "BTC".to_string(),
        timeframe: Timeframe::FourHour,
        current_position: position,
        last_signal: signal,
        last_signal_time: None,
        hull_value: Some(63_250.5),
        trend_value: None,
        hull_shifted: None,
        trend_shifted: None,
        close_price: 63_412.987,
        volume: 1_234_567.4,
        is_new_signal: true,
        signal_strength: 1.0,
    }
}

fn field<'a>(embed: &'a serde_json::Value, name: &str) -> &'a str {
    embed["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == name)
        .and_then(|f| f["value"].as_str())
        .unwrap()
}

#[test]
fn test_format_usd() {
    assert_eq!(format_usd(12_345.67), "$12,345.67");
    assert_eq!(format_usd(0.5), "$0.50");
    assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
    assert_eq!(format_usd(999.999), "$1,000.00");
    assert_eq!(format_usd(-42.1), "-$42.10");
}

#[test]
fn test_embed_fields() {
    let embed = format_signal_embed(&snapshot(Some(SignalEvent::LongEntry), Position::Long));

    assert_eq!(embed["color"], 0x00ff00);
    assert_eq!(field(&embed, "Symbol"), "BTC");
    assert_eq!(field(&embed, "Timeframe"), "4h");
    assert_eq!(field(&embed, "Price"), "$63,412.99");
    assert_eq!(field(&embed, "Signal"), "LONG ENTRY");
    assert_eq!(field(&embed, "Position"), "LONG");
    assert_eq!(field(&embed, "Volume"), "1,234,567");
    assert_eq!(field(&embed, "Hull MA"), "$63,250.50");
    assert_eq!(field(&embed, "Trend Filter"), "n/a");
    assert_eq!(field(&embed, "Signal Strength"), "1.00");
    assert_eq!(embed["footer"]["text"], "Bitcoin Trend Following Strategy");
}

#[test]
fn test_embed_colors() {
    let short = format_signal_embed(&snapshot(Some(SignalEvent::ShortExit), Position::Flat));
    assert_eq!(short["color"], 0xff0000);
    let exit = format_signal_embed(&snapshot(Some(SignalEvent::LongExit), Position::Flat));
    assert_eq!(exit["color"], 0x00ff00);
    let hold = format_signal_embed(&snapshot(None, Position::Flat));
    assert_eq!(hold["color"], 0xffff00);
    assert_eq!(field(&hold, "Signal"), "HOLD");
}
