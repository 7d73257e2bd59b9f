//! HMA (Hull Moving Average) indicator
//!
//! HMA(n) = WMA(2 * WMA(n / 2) - WMA(n), sqrt(n))

use super::wma::{calculate_wma, close_series};
use crate::models::Bar;

/// Length of the fast inner WMA: `round(length / 2)`, at least 1.
///
/// Rounds half up, so an odd length rounds its half away from zero (5 -> 3).
pub fn half_length(length: usize) -> usize {
    ((length as f64 / 2.0).round() as usize).max(1)
}

/// Length of the smoothing WMA: `round(sqrt(length))`, at least 1
pub fn root_length(length: usize) -> usize {
    ((length as f64).sqrt().round() as usize).max(1)
}

/// Index of the first value an HMA of `length` can produce, or `None` when
/// the length is degenerate and produces nothing.
pub fn first_valid_index(length: usize) -> Option<usize> {
    match length {
        0 => None,
        1 => Some(0),
        n => Some((n - 1) + (root_length(n) - 1)),
    }
}

/// Hull moving average over a nullable series.
///
/// - `length == 0`: all `None`
/// - `length == 1`: identity (the input, with non-finite values as `None`)
/// - otherwise `None` wherever any constituent WMA is `None`
pub fn calculate_hma(values: &[Option<f64>], length: usize) -> Vec<Option<f64>> {
    match length {
        0 => return vec![None; values.len()],
        1 => return values.iter().map(|v| v.filter(|x| x.is_finite())).collect(),
        _ => {}
    }

    let wma_half = calculate_wma(values, half_length(length));
    let wma_full = calculate_wma(values, length);

    let raw: Vec<Option<f64>> = wma_half
        .iter()
        .zip(wma_full.iter())
        .map(|(half, full)| match (half, full) {
            (Some(h), Some(f)) => Some(2.0 * h - f),
            _ => None,
        })
        .collect();

    calculate_wma(&raw, root_length(length))
}

/// HMA of bar closes
pub fn calculate_hma_closes(bars: &[Bar], length: usize) -> Vec<Option<f64>> {
    calculate_hma(&close_series(bars), length)
}
