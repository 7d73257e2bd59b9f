//! Prometheus metrics for the API server and worker.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub signal_evaluations_total: IntCounterVec,
    pub signal_evaluation_duration_seconds: Histogram,
    pub signal_alerts_total: IntCounter,
    pub database_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::with_opts(Opts::new("http_requests_total", "Total HTTP requests"))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = IntGauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let signal_evaluations_total = IntCounterVec::new(
            Opts::new(
                "signal_evaluations_total",
                "Signal evaluations by timeframe and outcome",
            ),
            &["timeframe", "outcome"],
        )?;
        let signal_evaluation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "signal_evaluation_duration_seconds",
                "Time spent loading a series and running the engine",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        let signal_alerts_total =
            IntCounter::with_opts(Opts::new("signal_alerts_total", "Signal alerts dispatched"))?;
        let database_connected = Gauge::with_opts(Opts::new(
            "database_connected",
            "1 when the OHLCV database is reachable",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(signal_evaluations_total.clone()))?;
        registry.register(Box::new(signal_evaluation_duration_seconds.clone()))?;
        registry.register(Box::new(signal_alerts_total.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            signal_evaluations_total,
            signal_evaluation_duration_seconds,
            signal_alerts_total,
            database_connected,
        })
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
