//! Shared data models spanning the engine layers.

pub mod bar;
pub mod signal;

pub use bar::{Bar, Timeframe};
pub use signal::{BarSignal, ChartBar, ChartData, ChartIndicators, Position, SignalEvent, SignalSnapshot};
