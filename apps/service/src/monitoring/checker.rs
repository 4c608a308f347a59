use std::time::{Duration, Instant};

use thiserror::Error;

use super::types::{CheckResult, Status, Target};

/// Map an HTTP response code onto a status
pub fn classify_status_code(status_code: u16) -> Status {
    if (200..300).contains(&status_code) { Status::Up } else { Status::Down }
}

/// Why a probe failed at the transport level. Only used for logging, every
/// kind is reported as [`Status::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailureKind {
    Timeout,
    Connect,
    Request,
}

/// The single error a probe can produce
#[derive(Debug, Error)]
#[error("probe failed ({kind:?}): {message}")]
pub struct ProbeFailed {
    pub kind: ProbeFailureKind,
    pub message: String,
}

impl From<reqwest::Error> for ProbeFailed {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            ProbeFailureKind::Timeout
        } else if error.is_connect() {
            ProbeFailureKind::Connect
        } else {
            ProbeFailureKind::Request
        };

        Self { kind, message: error.to_string() }
    }
}

/// Capability to probe a target. Implementations must not fail: transport
/// errors are folded into [`Status::Error`].
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn check(&self, target: &Target) -> CheckResult;
}

/// HTTP/HTTPS prober issuing one GET per check
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(timeout, Self::DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self::from_client(client))
    }

    /// Use a preconfigured client (proxies, TLS roots, ...). The client's
    /// own timeout applies to every probe.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Perform the request and return latency in milliseconds and status code
    pub async fn probe(&self, target: &Target) -> Result<(u64, u16), ProbeFailed> {
        let start = Instant::now();

        let response = self.client.get(target.as_str()).send().await?;

        let latency = start.elapsed().as_millis() as u64;
        Ok((latency, response.status().as_u16()))
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn check(&self, target: &Target) -> CheckResult {
        match self.probe(target).await {
            Ok((latency_ms, status_code)) => match classify_status_code(status_code) {
                Status::Up => CheckResult::up(target.clone(), latency_ms, status_code),
                _ => CheckResult::down(target.clone(), latency_ms, status_code),
            },
            Err(e) => {
                tracing::debug!(site = %target, kind = ?e.kind, "{}", e.message);
                CheckResult::error(target.clone(), e.to_string())
            }
        }
    }
}
