use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no targets to monitor")]
    NoTargets,
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("invalid check interval: {0}")]
    InvalidInterval(String),
    #[error("invalid probe timeout: {0}")]
    InvalidTimeout(String),
    #[error("checkers still running {0:?} after shutdown was requested")]
    ShutdownTimedOut(Duration),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
