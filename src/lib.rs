//! Hull trend signal engine and the services that feed and report it.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod services;
pub mod signals;

pub use error::StrategyError;
