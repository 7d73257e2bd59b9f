//! Trend indicators: WMA, HMA

pub mod hma;
pub mod wma;

pub use hma::*;
pub use wma::*;
