use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::checker::Prober;
use super::executor::MonitoringExecutor;
use super::policy::RetryPolicy;
use super::reporter::Reporter;
use super::types::{CheckResult, Status, Target};
use crate::error::MonitorError;

/// Sent by a checker once its probe has been reported
#[derive(Debug)]
struct Completion {
    target: Target,
    status: Option<Status>,
}

/// Everything a checker task needs, shared across all of them
struct CheckerContext {
    executor: MonitoringExecutor,
    reporter: Arc<dyn Reporter>,
    done_tx: mpsc::UnboundedSender<Completion>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Site monitor - keeps exactly one checker alive per target and restarts it
/// after the policy delay each time it completes
pub struct SiteMonitor {
    targets: Vec<Target>,
    executor: MonitoringExecutor,
    reporter: Arc<dyn Reporter>,
    policy: RetryPolicy,
}

impl SiteMonitor {
    /// Create a new monitor. Duplicate targets are collapsed.
    pub fn new(
        targets: impl IntoIterator<Item = Target>,
        prober: Arc<dyn Prober>,
        reporter: Arc<dyn Reporter>,
        policy: RetryPolicy,
    ) -> Result<Self, MonitorError> {
        let mut seen = HashSet::new();
        let targets: Vec<Target> =
            targets.into_iter().filter(|target| seen.insert(target.clone())).collect();

        if targets.is_empty() {
            return Err(MonitorError::NoTargets);
        }

        Ok(Self { targets, executor: MonitoringExecutor::new(prober), reporter, policy })
    }

    /// Bound the time a single probe may take
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.executor = self.executor.with_deadline(deadline);
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Start one checker per target, then hand the restart loop to a
    /// background task. Must be called from within a tokio runtime.
    pub fn spawn(self) -> MonitorHandle {
        let Self { targets, executor, reporter, policy } = self;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let ctx = Arc::new(CheckerContext { executor, reporter, done_tx, shutdown_rx });

        let mut checkers = JoinSet::new();
        for target in &targets {
            spawn_checker(&mut checkers, &ctx, target.clone(), Duration::ZERO);
        }
        info!("Started {} checkers", targets.len());

        let supervisor = tokio::spawn(supervise(ctx, checkers, done_rx, policy));

        MonitorHandle { shutdown_tx, supervisor }
    }

    /// Run until `shutdown` resolves, then stop cooperatively and wait for
    /// in-flight probes to finish.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), MonitorError> {
        let handle = self.spawn();
        shutdown.await;
        info!("Received shutdown signal...");
        handle.stop();
        handle.join().await;
        Ok(())
    }
}

/// Check every target in `targets` forever, waiting `interval` between two
/// checks of the same target, until `shutdown` resolves.
pub async fn start(
    targets: impl IntoIterator<Item = Target>,
    prober: Arc<dyn Prober>,
    reporter: Arc<dyn Reporter>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<(), MonitorError> {
    SiteMonitor::new(targets, prober, reporter, RetryPolicy::fixed(interval))?
        .run_until(shutdown)
        .await
}

/// Check every target once, concurrently, and return the results in target
/// order.
pub async fn check_once(
    targets: impl IntoIterator<Item = Target>,
    prober: Arc<dyn Prober>,
    reporter: Arc<dyn Reporter>,
) -> Result<Vec<CheckResult>, MonitorError> {
    let targets: Vec<Target> = targets.into_iter().collect();
    if targets.is_empty() {
        return Err(MonitorError::NoTargets);
    }

    let executor = Arc::new(MonitoringExecutor::new(prober));
    let mut checkers = JoinSet::new();

    for (index, target) in targets.iter().cloned().enumerate() {
        let executor = executor.clone();
        let reporter = reporter.clone();
        checkers.spawn(async move {
            let result = executor.execute_check(&target).await;
            reporter.report(&result);
            (index, result)
        });
    }

    let mut results: Vec<Option<CheckResult>> = vec![None; targets.len()];
    while let Some(joined) = checkers.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => error!("Checker task failed: {}", e),
        }
    }

    Ok(results
        .into_iter()
        .zip(targets)
        .map(|(result, target)| {
            result.unwrap_or_else(|| CheckResult::error(target, "checker task failed"))
        })
        .collect())
}

/// Control side of a running [`SiteMonitor`]. Dropping the handle stops the
/// monitor like [`MonitorHandle::stop`] does.
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    supervisor: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the monitor to stop. No new checker is started afterwards;
    /// checkers already probing finish and report.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Wait until the supervisor and every checker have exited
    pub async fn join(self) {
        if let Err(e) = self.supervisor.await {
            error!("Monitor supervisor failed: {}", e);
        }
    }

    /// Stop and wait up to `grace` for in-flight checkers. Whatever is still
    /// running afterwards is aborted.
    pub async fn shutdown(self, grace: Duration) -> Result<(), MonitorError> {
        self.stop();

        let mut supervisor = self.supervisor;
        match tokio::time::timeout(grace, &mut supervisor).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Monitor supervisor failed: {}", e);
                Ok(())
            }
            Err(_) => {
                warn!("Checkers did not finish within {:?}, aborting", grace);
                supervisor.abort();
                Err(MonitorError::ShutdownTimedOut(grace))
            }
        }
    }
}

/// Resolves once stop was requested or the handle was dropped
async fn stop_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
}

fn spawn_checker(
    checkers: &mut JoinSet<()>,
    ctx: &Arc<CheckerContext>,
    target: Target,
    delay: Duration,
) {
    let ctx = Arc::clone(ctx);
    checkers.spawn(run_checker(ctx, target, delay));
}

/// One delay-probe-report-signal cycle for a single target
async fn run_checker(ctx: Arc<CheckerContext>, target: Target, delay: Duration) {
    let mut shutdown_rx = ctx.shutdown_rx.clone();

    if !delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop_requested(&mut shutdown_rx) => {
                debug!("Checker for {} stopped before probing", target);
                return;
            }
        }
    }
    if *shutdown_rx.borrow() {
        return;
    }

    let cycle = async {
        let result = ctx.executor.execute_check(&target).await;
        ctx.reporter.report(&result);
        result.status
    };

    let status = match AssertUnwindSafe(cycle).catch_unwind().await {
        Ok(status) => Some(status),
        Err(_) => {
            error!("Checker for {} panicked", target);
            None
        }
    };

    // The supervisor may already be gone during shutdown
    let _ = ctx.done_tx.send(Completion { target, status });
}

/// Restart loop: waits for completions and schedules the next checker for
/// the same target
async fn supervise(
    ctx: Arc<CheckerContext>,
    mut checkers: JoinSet<()>,
    mut done_rx: mpsc::UnboundedReceiver<Completion>,
    policy: RetryPolicy,
) {
    let mut shutdown_rx = ctx.shutdown_rx.clone();
    let mut consecutive_errors: HashMap<Target, u32> = HashMap::new();

    loop {
        tokio::select! {
            biased;

            _ = stop_requested(&mut shutdown_rx) => break,

            Some(Completion { target, status }) = done_rx.recv() => {
                let errors = consecutive_errors.entry(target.clone()).or_default();
                match status {
                    Some(Status::Error) | None => *errors = errors.saturating_add(1),
                    Some(Status::Up | Status::Down) => *errors = 0,
                }

                let delay = policy.delay(*errors);
                debug!("Restarting checker for {} in {:?}", target, delay);
                spawn_checker(&mut checkers, &ctx, target, delay);
            }

            Some(joined) = checkers.join_next() => {
                if let Err(e) = joined {
                    error!("Checker task failed: {}", e);
                }
            }
        }
    }

    info!("Stopping monitor, waiting for {} checkers", checkers.len());
    while let Some(joined) = checkers.join_next().await {
        if let Err(e) = joined {
            error!("Checker task failed: {}", e);
        }
    }
    info!("Monitor stopped");
}
