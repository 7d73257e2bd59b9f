//! WMA (Weighted Moving Average) indicator

use crate::models::Bar;

/// Slides between exact recomputations of the running sums
const REANCHOR_INTERVAL: usize = 1024;

/// Lift raw prices into the nullable series the kernel works on.
///
/// Non-finite inputs (NaN, ±inf) become `None`.
pub fn to_series(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&v| if v.is_finite() { Some(v) } else { None })
        .collect()
}

/// Close prices of a bar series as a nullable series
pub fn close_series(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter()
        .map(|b| if b.close.is_finite() { Some(b.close) } else { None })
        .collect()
}

/// Weighted moving average with weights `1..=length`, newest bar heaviest.
///
/// Output has the same length as the input. An index is `None` until a full
/// window of `length` consecutive valid values ends there; any `None` inside
/// the window makes the result `None`. `length == 0` yields an all-`None`
/// series.
///
/// Runs in O(N): a plain sum and a weighted sum slide with the window, and
/// both are reset whenever a null breaks the run. Every `REANCHOR_INTERVAL`
/// slides (or `length`, if larger) they are recomputed from the window so
/// rounding error does not build up over long series.
pub fn calculate_wma(values: &[Option<f64>], length: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if length == 0 {
        return out;
    }

    let denominator = (length * (length + 1)) as f64 / 2.0;
    let weight_max = length as f64;

    let mut run = 0usize;
    let mut sum = 0.0;
    let mut weighted_sum = 0.0;
    let mut slides = 0usize;
    let reanchor_every = REANCHOR_INTERVAL.max(length);

    for (i, value) in values.iter().enumerate() {
        let x = match value {
            Some(x) if x.is_finite() => *x,
            _ => {
                run = 0;
                slides = 0;
                sum = 0.0;
                weighted_sum = 0.0;
                continue;
            }
        };

        if run < length {
            run += 1;
            weighted_sum += run as f64 * x;
            sum += x;
        } else if slides + 1 >= reanchor_every {
            slides = 0;
            let (plain, weighted) = window_sums(&values[i + 1 - length..=i]);
            sum = plain;
            weighted_sum = weighted;
        } else {
            slides += 1;
            // Every weight in the old window drops by one and the oldest
            // value (weight 1) falls out; the new value enters at full weight.
            let dropped = values[i - length].unwrap_or_default();
            weighted_sum += weight_max * x - sum;
            sum += x - dropped;
        }

        if run == length {
            out[i] = Some(weighted_sum / denominator);
        }
    }

    out
}

/// Plain and weighted (1..=len) sums of a fully valid window
fn window_sums(window: &[Option<f64>]) -> (f64, f64) {
    window
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(plain, weighted), (k, v)| {
            let x = v.unwrap_or_default();
            (plain + x, weighted + (k + 1) as f64 * x)
        })
}

/// WMA of bar closes
pub fn calculate_wma_closes(bars: &[Bar], length: usize) -> Vec<Option<f64>> {
    calculate_wma(&close_series(bars), length)
}
