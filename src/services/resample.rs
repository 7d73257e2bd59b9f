//! Aggregate bars into coarser timeframes

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::Bar;

/// Resample bars into UTC-aligned buckets of `hours` hours.
///
/// Per bucket: first open, max high, min low, last close, summed volume.
/// Buckets without bars are not emitted. Input order does not matter; output
/// is sorted by bucket start.
pub fn resample(bars: &[Bar], hours: i64) -> Vec<Bar> {
    if hours <= 0 {
        return Vec::new();
    }
    let bucket_secs = hours * 3600;

    let mut sorted: Vec<&Bar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);

    let mut buckets: BTreeMap<i64, Bar> = BTreeMap::new();
    for bar in sorted {
        let start = bar.timestamp.timestamp().div_euclid(bucket_secs) * bucket_secs;
        buckets
            .entry(start)
            .and_modify(|agg| {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            })
            .or_insert_with(|| Bar {
                timestamp: bucket_start(start),
                ..*bar
            });
    }

    buckets.into_values().collect()
}

/// Resample hourly bars into 4h bars (00, 04, ..., 20 UTC)
pub fn resample_4h(bars: &[Bar]) -> Vec<Bar> {
    resample(bars, 4)
}

fn bucket_start(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
