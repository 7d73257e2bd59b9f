//! Services around the engine: data access, resampling, orchestration.

pub mod market_data;
pub mod resample;
pub mod signal_service;

pub use market_data::{InMemorySeriesProvider, SeriesProvider};
pub use signal_service::{SignalCheckSummary, SignalService};
