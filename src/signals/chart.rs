//! Chart-ready output: per-bar indicators and signals, trimmed to a window

use tracing::warn;

use crate::models::{Bar, BarSignal, ChartBar, ChartData, ChartIndicators, Timeframe};
use crate::signals::engine::SignalEngine;

/// Bars fetched for a chart request, enough to warm up the trend line
pub fn chart_fetch_limit(limit: usize, trend_length: usize) -> usize {
    (limit + trend_length).max(2000)
}

/// Build chart data for the last `limit` bars of `bars`.
///
/// When the series is shorter than the trend length the engine is skipped and
/// the bars are reported price-only with a warning.
pub fn build_chart_data(
    engine: &SignalEngine,
    bars: &[Bar],
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
) -> ChartData {
    let config = *engine.config();
    let has_indicators = engine.has_sufficient_history(bars.len());

    let rows: Vec<BarSignal> = if has_indicators {
        engine.evaluate(bars)
    } else {
        warn!(
            timeframe = %timeframe,
            need = config.trend_length,
            have = bars.len(),
            "Not enough data for {} indicators (need {}, have {})",
            timeframe,
            config.trend_length,
            bars.len()
        );
        bars.iter().copied().map(BarSignal::price_only).collect()
    };

    let start = rows.len().saturating_sub(limit);
    let data: Vec<ChartBar> = rows[start..].iter().map(ChartBar::from).collect();

    ChartData {
        symbol: symbol.to_string(),
        timeframe,
        data,
        indicators: ChartIndicators {
            hull_length: config.hull_length,
            trend_length: config.trend_length,
        },
        warning: if has_indicators {
            None
        } else {
            Some(format!(
                "Insufficient data for strategy (need {}+ bars, showing price only)",
                config.trend_length
            ))
        },
    }
}
