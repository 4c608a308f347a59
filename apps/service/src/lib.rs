//! sitewatch - keeps checking a fixed list of sites and reports whether each
//! one is up, down, or unreachable.

pub mod config;
pub mod error;
pub mod monitoring;

pub use error::MonitorError;
