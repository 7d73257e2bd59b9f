//! Series data access.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StrategyError;
use crate::models::{Bar, Timeframe};

#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Latest `limit` bars for a symbol/timeframe, oldest first.
    ///
    /// An empty vec means no data is stored.
    async fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, StrategyError>;

    /// Upsert bars for a symbol/timeframe; returns the number written
    async fn store_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        bars: &[Bar],
    ) -> Result<u64, StrategyError>;
}

/// Series held in memory, keyed by symbol and timeframe
#[derive(Default)]
pub struct InMemorySeriesProvider {
    series: RwLock<HashMap<(String, Timeframe), Vec<Bar>>>,
}

impl InMemorySeriesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge bars into the stored series.
    ///
    /// Bars are kept sorted by timestamp; a bar with an existing timestamp
    /// replaces the stored one.
    pub async fn insert(&self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) {
        let mut series = self.series.write().await;
        let stored = series.entry((symbol.to_string(), timeframe)).or_default();
        for bar in bars {
            match stored.binary_search_by_key(&bar.timestamp, |b| b.timestamp) {
                Ok(pos) => stored[pos] = bar,
                Err(pos) => stored.insert(pos, bar),
            }
        }
    }
}

#[async_trait]
impl SeriesProvider for InMemorySeriesProvider {
    async fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, StrategyError> {
        let series = self.series.read().await;
        Ok(series
            .get(&(symbol.to_string(), timeframe))
            .map(|bars| bars[bars.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default())
    }

    async fn store_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        bars: &[Bar],
    ) -> Result<u64, StrategyError> {
        self.insert(symbol, timeframe, bars.to_vec()).await;
        Ok(bars.len() as u64)
    }
}
