//! Discord webhook alerts

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::SignalNotifier;
use crate::error::StrategyError;
use crate::models::{Position, SignalEvent, SignalSnapshot, Timeframe};

const BOT_USERNAME: &str = "Bitcoin Trend Bot";
const FOOTER_TEXT: &str = "Bitcoin Trend Following Strategy";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: usize = 2;

const COLOR_GREEN: u32 = 0x00ff00;
const COLOR_RED: u32 = 0xff0000;
const COLOR_YELLOW: u32 = 0xffff00;

pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl DiscordNotifier {
    /// Create a notifier; without a webhook URL every send is a no-op
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_some() {
            info!("Discord alerts enabled");
        } else {
            warn!("No Discord webhook URL provided. Alerts will be disabled.");
        }
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn from_env() -> Self {
        Self::new(crate::config::get_discord_webhook_url())
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn post(&self, payload: &Value) -> Result<bool, StrategyError> {
        let Some(url) = self.webhook_url.as_deref() else {
            debug!("Discord alerts disabled");
            return Ok(false);
        };

        let response = (|| async move {
            self.client
                .post(url)
                .timeout(REQUEST_TIMEOUT)
                .json(payload)
                .send()
                .await
        })
        .retry(ExponentialBuilder::default().with_max_times(MAX_RETRIES))
        .when(|e: &reqwest::Error| e.is_timeout() || e.is_connect())
        .notify(|e: &reqwest::Error, delay: Duration| {
            warn!(error = %e, delay_ms = delay.as_millis() as u64, "Discord webhook send failed, retrying");
        })
        .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            Ok(true)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Discord webhook failed");
            Ok(false)
        }
    }
}

#[async_trait]
impl SignalNotifier for DiscordNotifier {
    async fn send_signal_alert(&self, snapshot: &SignalSnapshot) -> Result<bool, StrategyError> {
        let payload = json!({
            "embeds": [format_signal_embed(snapshot)],
            "username": BOT_USERNAME,
        });
        let sent = self.post(&payload).await?;
        if sent {
            info!(
                symbol = %snapshot.symbol,
                timeframe = %snapshot.timeframe,
                signal = ?snapshot.last_signal,
                "Discord alert sent"
            );
        }
        Ok(sent)
    }

    async fn send_error_alert(&self, message: &str, context: &str) -> Result<bool, StrategyError> {
        let context = if context.is_empty() { "Unknown" } else { context };
        let payload = json!({
            "embeds": [{
                "title": "Strategy Error",
                "color": COLOR_RED,
                "timestamp": Utc::now().to_rfc3339(),
                "fields": [
                    { "name": "Error", "value": message, "inline": false },
                    { "name": "Context", "value": context, "inline": false },
                ],
                "footer": { "text": FOOTER_TEXT },
            }],
            "username": BOT_USERNAME,
        });
        self.post(&payload).await
    }

    async fn send_test_alert(&self) -> Result<bool, StrategyError> {
        let snapshot = SignalSnapshot {
            timestamp: Utc::now(),
            symbol: "BTC".to_string(),
            timeframe: Timeframe::OneHour,
            current_position: Position::Flat,
            last_signal: None,
            last_signal_time: None,
            hull_value: Some(50_100.0),
            trend_value: Some(49_900.0),
            hull_shifted: None,
            trend_shifted: None,
            close_price: 50_000.0,
            volume: 1_000_000.0,
            is_new_signal: false,
            signal_strength: 0.0,
        };
        self.send_signal_alert(&snapshot).await
    }
}

/// Render a snapshot as a Discord embed object
pub fn format_signal_embed(snapshot: &SignalSnapshot) -> Value {
    let signal = snapshot.last_signal.unwrap_or(SignalEvent::Hold);

    let color = if signal.is_long_side() {
        COLOR_GREEN
    } else if signal.is_short_side() {
        COLOR_RED
    } else {
        COLOR_YELLOW
    };

    let description = match signal {
        SignalEvent::LongEntry => "**LONG ENTRY** - Trend is up and Hull MA is bullish",
        SignalEvent::LongExit => "**LONG EXIT** - Hull MA turned bearish",
        SignalEvent::ShortEntry => "**SHORT ENTRY** - Trend is down and Hull MA is bearish",
        SignalEvent::ShortExit => "**SHORT EXIT** - Hull MA turned bullish",
        SignalEvent::Hold => "**HOLD** - No signal change",
    };

    json!({
        "title": "Bitcoin Trend Signal",
        "description": description,
        "color": color,
        "timestamp": snapshot.timestamp.to_rfc3339(),
        "fields": [
            field("Symbol", snapshot.symbol.clone()),
            field("Timeframe", snapshot.timeframe.to_string()),
            field("Price", format_usd(snapshot.close_price)),
            field("Signal", signal.as_str().to_uppercase().replace('_', " ")),
            field("Position", snapshot.current_position.as_str().to_uppercase()),
            field("Volume", group_thousands(snapshot.volume.round() as i64)),
            field("Hull MA", snapshot.hull_value.map(format_usd).unwrap_or_else(|| "n/a".to_string())),
            field("Trend Filter", snapshot.trend_value.map(format_usd).unwrap_or_else(|| "n/a".to_string())),
            field("Signal Strength", format!("{:.2}", snapshot.signal_strength)),
        ],
        "footer": { "text": FOOTER_TEXT },
    })
}

fn field(name: &str, value: String) -> Value {
    json!({ "name": name, "value": value, "inline": true })
}

/// `$12,345.67`
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let sign = if value < 0.0 && cents != 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
