use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use super::checker::Prober;
use super::types::{CheckResult, Target};

/// Monitoring executor - runs a single probe under a hard deadline
pub struct MonitoringExecutor {
    prober: Arc<dyn Prober>,
    deadline: Duration,
}

impl MonitoringExecutor {
    /// Default upper bound on one probe, above any sane client timeout
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober, deadline: Self::DEFAULT_DEADLINE }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Execute a monitoring check. Never fails: a probe overrunning the
    /// deadline is reported as an error result.
    pub async fn execute_check(&self, target: &Target) -> CheckResult {
        let start = Instant::now();

        match timeout(self.deadline, self.prober.check(target)).await {
            Ok(result) => result.with_latency_if_missing(start.elapsed().as_millis() as u64),
            Err(_) => CheckResult::error(
                target.clone(),
                format!("probe timed out after {:?}", self.deadline),
            ),
        }
    }
}
