//! Signal generation: the Hull/Trend engine, session tracking and chart output.

pub mod chart;
pub mod engine;
pub mod session;

pub use chart::*;
pub use engine::*;
pub use session::*;
