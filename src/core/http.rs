//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::error::StrategyError;
use crate::metrics::Metrics;
use crate::models::{ChartData, SignalSnapshot, Timeframe};
use crate::notifications::SignalNotifier;
use crate::services::signal_service::SignalService;

pub const SERVICE_NAME: &str = "hulltrend-signal-engine";
const DEFAULT_CHART_LIMIT: usize = 500;
const DEFAULT_OHLCV_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub service: Arc<SignalService>,
    pub notifier: Arc<dyn SignalNotifier>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Error response rendered as `{"error": reason}`
#[derive(Debug)]
pub struct ApiError(StrategyError);

impl From<StrategyError> for ApiError {
    fn from(e: StrategyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            StrategyError::UnknownTimeframe(_) | StrategyError::InvalidConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            StrategyError::NoData { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": SERVICE_NAME
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Current signal snapshot for a timeframe
async fn get_signal(
    State(state): State<AppState>,
    Path(timeframe): Path<String>,
) -> Result<Json<SignalSnapshot>, ApiError> {
    let timeframe: Timeframe = timeframe.parse()?;
    Ok(Json(state.service.current_signal(timeframe).await?))
}

/// Chart bars with indicators and signals
async fn get_chart_data(
    State(state): State<AppState>,
    Path(timeframe): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ChartData>, ApiError> {
    let timeframe: Timeframe = timeframe.parse()?;
    let limit = params.limit.unwrap_or(DEFAULT_CHART_LIMIT);
    Ok(Json(state.service.strategy_data(timeframe, limit).await?))
}

/// Raw OHLCV bars
async fn get_ohlcv(
    State(state): State<AppState>,
    Path(timeframe): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
    let timeframe: Timeframe = timeframe.parse()?;
    let limit = params.limit.unwrap_or(DEFAULT_OHLCV_LIMIT);
    let bars = state.service.ohlcv(timeframe, limit).await?;

    let data: Vec<Value> = bars
        .iter()
        .map(|b| {
            json!({
                "time": b.time_millis(),
                "open": b.open,
                "high": b.high,
                "low": b.low,
                "close": b.close,
                "volume": b.volume,
            })
        })
        .collect();

    Ok(Json(json!({
        "symbol": state.service.base_symbol(),
        "timeframe": timeframe,
        "data": data,
    })))
}

/// Re-check every timeframe and alert on new signals
async fn update_signals(State(state): State<AppState>) -> Json<Value> {
    let summary = state.service.check_signals(state.notifier.as_ref()).await;
    info!(new_signals = summary.new_signals, "Signal update complete");
    Json(json!({
        "status": "success",
        "message": format!("Checked signals for {}", state.service.base_symbol()),
        "signal_update": summary,
    }))
}

async fn test_discord(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sent = state.notifier.send_test_alert().await?;
    let message = if sent {
        "Discord test alert sent"
    } else {
        "Discord test alert not delivered (webhook disabled or rejected)"
    };
    Ok(Json(json!({
        "status": if sent { "success" } else { "failed" },
        "message": message,
    })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/signal/{timeframe}", get(get_signal))
        .route("/api/chart/{timeframe}", get(get_chart_data))
        .route("/api/ohlcv/{timeframe}", get(get_ohlcv))
        .route("/api/update", post(update_signals))
        .route("/api/test-discord", post(test_discord))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    metrics: Arc<Metrics>,
    service: Arc<SignalService>,
    notifier: Arc<dyn SignalNotifier>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        service,
        notifier,
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
