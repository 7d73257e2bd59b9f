//! Alert delivery for signal snapshots.

pub mod discord;

use async_trait::async_trait;

use crate::error::StrategyError;
use crate::models::SignalSnapshot;

pub use discord::DiscordNotifier;

/// Destination for signal and error alerts.
///
/// `Ok(false)` means the alert was not delivered (disabled or rejected) without
/// a transport failure.
#[async_trait]
pub trait SignalNotifier: Send + Sync {
    async fn send_signal_alert(&self, snapshot: &SignalSnapshot) -> Result<bool, StrategyError>;

    async fn send_error_alert(&self, message: &str, context: &str) -> Result<bool, StrategyError>;

    async fn send_test_alert(&self) -> Result<bool, StrategyError>;
}
