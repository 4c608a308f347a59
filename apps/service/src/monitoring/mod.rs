/// Monitoring engine module - keeps a fixed set of sites under continuous
/// check
///
/// This module is responsible for:
/// - Probing targets over HTTP/HTTPS and classifying the outcome
/// - Restarting one checker per target after a rate-limiting delay
/// - Reporting every result and keeping a short per-target history
pub mod checker;
pub mod executor;
pub mod history;
pub mod policy;
pub mod reporter;
pub mod scheduler;
pub mod types;
pub mod validation;

pub use checker::{HttpProber, ProbeFailed, Prober, classify_status_code};
pub use executor::MonitoringExecutor;
pub use history::StatusHistory;
pub use policy::{Backoff, RetryPolicy};
pub use reporter::{ConsoleReporter, Fanout, LogReporter, OutputFormat, Reporter};
pub use scheduler::{MonitorHandle, SiteMonitor, check_once, start};
pub use types::{CheckResult, Status, Target};
