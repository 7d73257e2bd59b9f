//! Postgres/TimescaleDB storage for OHLCV bars
//!
//! Prices are stored as integer cents and converted back to dollars on read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use crate::error::StrategyError;
use crate::models::{Bar, Timeframe};
use crate::services::market_data::SeriesProvider;

const PRICE_MULTIPLIER: f64 = 100.0;

/// Asset metadata recorded alongside the first insert for a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub name: String,
    pub exchange: String,
    pub tick_size: f64,
    pub multiplier: i32,
    pub currency: String,
}

impl AssetInfo {
    pub fn for_symbol(symbol: &str) -> Self {
        match symbol {
            "BTCUSD" => Self {
                name: "Bitcoin Spot".to_string(),
                exchange: "COINBASE".to_string(),
                tick_size: 0.01,
                multiplier: 1,
                currency: "USD".to_string(),
            },
            _ => Self {
                name: format!("Bitcoin {}", symbol),
                exchange: "UNKNOWN".to_string(),
                tick_size: 0.01,
                multiplier: 1,
                currency: "USD".to_string(),
            },
        }
    }
}

pub fn to_cents(price: f64) -> i64 {
    (price * PRICE_MULTIPLIER) as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / PRICE_MULTIPLIER
}

pub struct OhlcvDatabase {
    client: Client,
}

impl OhlcvDatabase {
    pub async fn connect(database_url: &str) -> Result<Self, StrategyError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| StrategyError::Database(format!("Failed to connect to database: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection error");
            }
        });

        let db = Self { client };
        db.init_schema().await?;
        info!("Connected to OHLCV database");
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), StrategyError> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS crypto_assets (
                    asset_id SERIAL PRIMARY KEY,
                    symbol TEXT NOT NULL,
                    name TEXT,
                    exchange TEXT NOT NULL,
                    tick_size DOUBLE PRECISION,
                    multiplier INTEGER,
                    currency TEXT,
                    last_trade_date TIMESTAMPTZ,
                    UNIQUE (symbol, exchange)
                );
                CREATE TABLE IF NOT EXISTS crypto_ohlcv (
                    time TIMESTAMPTZ NOT NULL,
                    asset_id INTEGER NOT NULL REFERENCES crypto_assets (asset_id),
                    symbol TEXT NOT NULL,
                    open BIGINT NOT NULL,
                    high BIGINT NOT NULL,
                    low BIGINT NOT NULL,
                    close BIGINT NOT NULL,
                    volume BIGINT NOT NULL,
                    PRIMARY KEY (time, asset_id)
                );",
            )
            .await
            .map_err(|e| StrategyError::Database(format!("Failed to create schema: {}", e)))
    }

    /// Look up the asset row for a symbol, creating it on first use
    pub async fn get_or_create_asset(&self, symbol: &str) -> Result<i32, StrategyError> {
        let info = AssetInfo::for_symbol(symbol);
        let row = self
            .client
            .query_one(
                "INSERT INTO crypto_assets (symbol, name, exchange, tick_size, multiplier, currency)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (symbol, exchange)
                 DO UPDATE SET last_trade_date = EXCLUDED.last_trade_date
                 RETURNING asset_id",
                &[
                    &symbol,
                    &info.name,
                    &info.exchange,
                    &info.tick_size,
                    &info.multiplier,
                    &info.currency,
                ],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    /// Upsert bars for a symbol; returns the number of rows written
    pub async fn store_bars(&self, symbol: &str, bars: &[Bar]) -> Result<u64, StrategyError> {
        if bars.is_empty() {
            return Ok(0);
        }
        let asset_id = self.get_or_create_asset(symbol).await?;

        let statement = self
            .client
            .prepare(
                "INSERT INTO crypto_ohlcv (time, asset_id, symbol, open, high, low, close, volume)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (time, asset_id) DO UPDATE SET
                     open = EXCLUDED.open,
                     high = EXCLUDED.high,
                     low = EXCLUDED.low,
                     close = EXCLUDED.close,
                     volume = EXCLUDED.volume",
            )
            .await?;

        let mut written = 0;
        for bar in bars {
            written += self
                .client
                .execute(
                    &statement,
                    &[
                        &bar.timestamp,
                        &asset_id,
                        &symbol,
                        &to_cents(bar.open),
                        &to_cents(bar.high),
                        &to_cents(bar.low),
                        &to_cents(bar.close),
                        &(bar.volume as i64),
                    ],
                )
                .await?;
        }

        info!(symbol = %symbol, rows = written, "Stored {} bars for {}", written, symbol);
        Ok(written)
    }

    async fn query_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, StrategyError> {
        let limit = limit as i64;
        let rows = match timeframe {
            // Daily series keep only bars stamped at midnight UTC
            Timeframe::OneDay => {
                self.client
                    .query(
                        "SELECT co.time, co.open, co.high, co.low, co.close, co.volume
                         FROM crypto_ohlcv co
                         JOIN crypto_assets ca ON co.asset_id = ca.asset_id
                         WHERE ca.symbol = $1
                           AND EXTRACT(HOUR FROM (co.time AT TIME ZONE 'UTC')) = 0
                           AND EXTRACT(MINUTE FROM (co.time AT TIME ZONE 'UTC')) = 0
                         ORDER BY co.time DESC
                         LIMIT $2",
                        &[&symbol, &limit],
                    )
                    .await?
            }
            // Intraday series drop bars whose spacing from the previous bar
            // is off the timeframe interval by more than half an hour
            _ => {
                let interval_hours = timeframe.interval_hours() as f64;
                self.client
                    .query(
                        "WITH spaced AS (
                             SELECT co.time, co.open, co.high, co.low, co.close, co.volume,
                                    EXTRACT(EPOCH FROM (co.time - LAG(co.time) OVER (ORDER BY co.time)))::float8
                                        / 3600.0 AS hours_diff
                             FROM crypto_ohlcv co
                             JOIN crypto_assets ca ON co.asset_id = ca.asset_id
                             WHERE ca.symbol = $1
                         )
                         SELECT time, open, high, low, close, volume
                         FROM spaced
                         WHERE hours_diff IS NULL
                            OR (hours_diff >= $2::float8 - 0.5 AND hours_diff <= $2::float8 + 0.5)
                         ORDER BY time DESC
                         LIMIT $3",
                        &[&symbol, &interval_hours, &limit],
                    )
                    .await?
            }
        };

        let mut bars = rows
            .iter()
            .map(row_to_bar)
            .collect::<Result<Vec<_>, _>>()?;
        // Queried newest first; the engine wants oldest first
        bars.reverse();

        debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            count = bars.len(),
            "Loaded {} bars for {} ({})",
            bars.len(),
            symbol,
            timeframe
        );
        Ok(bars)
    }
}

fn row_to_bar(row: &Row) -> Result<Bar, StrategyError> {
    let timestamp: DateTime<Utc> = row.try_get(0)?;
    let open: i64 = row.try_get(1)?;
    let high: i64 = row.try_get(2)?;
    let low: i64 = row.try_get(3)?;
    let close: i64 = row.try_get(4)?;
    let volume: i64 = row.try_get(5)?;

    Ok(Bar::new(
        from_cents(open),
        from_cents(high),
        from_cents(low),
        from_cents(close),
        volume as f64,
        timestamp,
    ))
}

#[async_trait]
impl SeriesProvider for OhlcvDatabase {
    async fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, StrategyError> {
        self.query_series(symbol, timeframe, limit).await
    }

    async fn store_series(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        bars: &[Bar],
    ) -> Result<u64, StrategyError> {
        self.store_bars(symbol, bars).await
    }
}
