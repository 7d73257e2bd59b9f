//! Error taxonomy shared by the engine and its adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("No data available for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown timeframe '{0}' (expected 1h, 4h or 1d)")]
    UnknownTimeframe(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl StrategyError {
    pub fn no_data(symbol: &str, timeframe: impl ToString) -> Self {
        Self::NoData {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        }
    }
}

impl From<tokio_postgres::Error> for StrategyError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<reqwest::Error> for StrategyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Notification(e.to_string())
    }
}
