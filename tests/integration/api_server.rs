//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, and signal routes.

#[path = "api_server/test_utils.rs"]
mod api_test_utils;

use hulltrend::models::Timeframe;
use serde_json::Value;

use crate::test_utils::rally_bars;
use api_test_utils::TestApiServer;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "hulltrend-signal-engine");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected http_requests_total metric"
    );
    assert!(
        body.contains("http_request_duration_seconds"),
        "Expected http_request_duration_seconds metric"
    );
    assert!(
        body.contains("http_requests_in_flight"),
        "Expected http_requests_in_flight metric"
    );
}

#[tokio::test]
async fn signal_endpoint_rejects_unknown_timeframe() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/signal/2h").await;
    assert_eq!(response.status_code(), 400);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("2h"));
}

#[tokio::test]
async fn signal_endpoint_returns_not_found_without_data() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/signal/4h").await;
    assert_eq!(response.status_code(), 404);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("BTC_4H"));
}

#[tokio::test]
async fn signal_endpoint_reports_latest_snapshot() {
    let app = TestApiServer::new().await;
    let bars = rally_bars(12);
    app.provider.insert("BTC", Timeframe::OneHour, bars.clone()).await;

    let response = app.server.get("/api/signal/1h").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["timeframe"], "1h");
    assert_eq!(body["current_position"], "long");
    assert_eq!(body["last_signal"], "long_entry");
    assert_eq!(body["is_new_signal"], true);
    assert_eq!(body["close_price"], 111.0);
    assert_eq!(body["signal_strength"], 1.0);

    // Same latest bar again: already recorded
    let again: Value = app.server.get("/api/signal/1h").await.json();
    assert_eq!(again["is_new_signal"], false);
    assert_eq!(again["last_signal"], "long_entry");
}

#[tokio::test]
async fn chart_endpoint_returns_limited_rows() {
    let app = TestApiServer::new().await;
    let bars = rally_bars(30);
    app.provider.insert("BTC", Timeframe::OneHour, bars.clone()).await;

    let response = app
        .server
        .get("/api/chart/1h")
        .add_query_param("limit", 5)
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 5);
    assert_eq!(data[4]["time"], bars[29].time_millis());
    assert!(data[4]["hull"].as_f64().is_some());
    assert!(body["warning"].is_null());
    assert_eq!(body["indicators"]["hull_length"], 4);
    assert_eq!(body["indicators"]["trend_length"], 9);
}

#[tokio::test]
async fn chart_endpoint_warns_on_short_history() {
    let app = TestApiServer::new().await;
    app.provider.insert("BTC", Timeframe::OneHour, rally_bars(4)).await;

    let body: Value = app.server.get("/api/chart/1h").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["warning"],
        "Insufficient data for strategy (need 9+ bars, showing price only)"
    );
    assert_eq!(body["data"][3]["signal"], "hold");
}

#[tokio::test]
async fn ohlcv_endpoint_returns_raw_bars() {
    let app = TestApiServer::new().await;
    let bars = rally_bars(10);
    app.provider.insert("BTC", Timeframe::OneHour, bars.clone()).await;

    let response = app
        .server
        .get("/api/ohlcv/1h")
        .add_query_param("limit", 3)
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["timeframe"], "1h");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["time"], bars[7].time_millis());
    assert_eq!(data[2]["close"], 109.0);
}

#[tokio::test]
async fn update_endpoint_alerts_once_per_signal() {
    let app = TestApiServer::new().await;
    app.provider.insert("BTC", Timeframe::OneHour, rally_bars(12)).await;

    let response = app.server.post("/api/update").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["signal_update"]["new_signals"], 1);
    assert_eq!(body["signal_update"]["timeframes"]["1h"]["last_signal"], "long_entry");
    // 4h is rebuilt from the hourly bars; 1d has no data and is skipped
    assert_eq!(body["signal_update"]["timeframes"]["4h"]["is_new_signal"], false);
    assert!(body["signal_update"]["timeframes"]["1d"].is_null());
    assert!(app.notifier.errors.lock().await.is_empty());
    assert_eq!(app.notifier.alerts.lock().await.len(), 1);

    let second: Value = app.server.post("/api/update").await.json();
    assert_eq!(second["signal_update"]["new_signals"], 0);
    assert_eq!(app.notifier.alerts.lock().await.len(), 1);
}

#[tokio::test]
async fn test_discord_endpoint_uses_notifier() {
    let app = TestApiServer::new().await;
    let response = app.server.post("/api/test-discord").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_discord_endpoint_reports_undelivered_alert() {
    let app = TestApiServer::with_disabled_discord().await;
    let response = app.server.post("/api/test-discord").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "failed");
    assert!(body["message"].as_str().unwrap().contains("not delivered"));
}

#[tokio::test]
async fn test_discord_endpoint_reports_sent_alert() {
    let app = TestApiServer::new().await;
    let body: Value = app.server.post("/api/test-discord").await.json();
    assert_eq!(body["message"], "Discord test alert sent");
}
