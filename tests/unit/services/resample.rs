//! Unit tests for bar resampling

use chrono::{Duration, TimeZone, Timelike, Utc};
use hulltrend::models::Bar;
use hulltrend::services::resample::{resample, resample_4h};

fn hourly(start_hour: i64, count: i64) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (start_hour..start_hour + count)
        .map(|h| {
            let base = 100.0 + h as f64;
            Bar::new(base, base + 2.0, base - 3.0, base + 1.0, 10.0 + h as f64, start + Duration::hours(h))
        })
        .collect()
}

#[test]
fn test_resample_4h_aggregates_buckets() {
    let bars = hourly(0, 8);
    let result = resample_4h(&bars);

    assert_eq!(result.len(), 2);
    let first = &result[0];
    assert_eq!(first.timestamp, bars[0].timestamp);
    assert_eq!(first.open, bars[0].open);
    assert_eq!(first.high, bars[3].high);
    assert_eq!(first.low, bars[0].low);
    assert_eq!(first.close, bars[3].close);
    assert_eq!(first.volume, 10.0 + 11.0 + 12.0 + 13.0);

    let second = &result[1];
    assert_eq!(second.timestamp.hour(), 4);
    assert_eq!(second.open, bars[4].open);
    assert_eq!(second.close, bars[7].close);
}

#[test]
fn test_resample_aligns_to_utc_boundaries() {
    // Starts mid-bucket at 02:00
    let result = resample_4h(&hourly(2, 4));
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].timestamp.hour(), 0);
    assert_eq!(result[0].open, 102.0);
    assert_eq!(result[0].close, 104.0);
    assert_eq!(result[1].timestamp.hour(), 4);
}

#[test]
fn test_resample_ignores_input_order() {
    let mut bars = hourly(0, 4);
    bars.reverse();
    let result = resample_4h(&bars);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].open, 100.0);
    assert_eq!(result[0].close, 104.0);
}

#[test]
fn test_resample_drops_empty_buckets() {
    let mut bars = hourly(0, 2);
    bars.extend(hourly(12, 2));
    let result = resample_4h(&bars);
    assert_eq!(result.len(), 2);
    assert_eq!(result[1].timestamp.hour(), 12);
}

#[test]
fn test_resample_rejects_non_positive_hours() {
    assert!(resample(&hourly(0, 4), 0).is_empty());
}
