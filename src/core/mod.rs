//! Application surfaces: HTTP server and scheduler

pub mod http;
pub mod scheduler;

pub use http::*;
pub use scheduler::*;
