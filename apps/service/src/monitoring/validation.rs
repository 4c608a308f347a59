//! Checks applied to configuration before a monitor starts.

use std::time::Duration;

use url::Url;

use crate::error::MonitorError;

const MAX_INTERVAL: Duration = Duration::from_secs(86400); // 24 hours
const MIN_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

/// Validate an HTTP/HTTPS target
pub fn validate_target(target: &str) -> Result<(), MonitorError> {
    let invalid = |reason: String| MonitorError::InvalidTarget { target: target.to_string(), reason };

    let url = Url::parse(target).map_err(|e| invalid(format!("not a URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    if url.port() == Some(0) {
        return Err(invalid("port 0 is not valid".to_string()));
    }

    Ok(())
}

pub fn validate_targets<'a>(targets: impl IntoIterator<Item = &'a str>) -> Result<(), MonitorError> {
    let mut any = false;
    for target in targets {
        validate_target(target)?;
        any = true;
    }

    if any { Ok(()) } else { Err(MonitorError::NoTargets) }
}

/// Zero is allowed: checks then restart back to back
pub fn validate_check_interval(interval: Duration) -> Result<(), MonitorError> {
    if interval > MAX_INTERVAL {
        return Err(MonitorError::InvalidInterval(format!(
            "{interval:?} is longer than the maximum of {MAX_INTERVAL:?}"
        )));
    }

    Ok(())
}

pub fn validate_timeout(timeout: Duration) -> Result<(), MonitorError> {
    if timeout < MIN_TIMEOUT {
        return Err(MonitorError::InvalidTimeout(format!(
            "{timeout:?} is shorter than the minimum of {MIN_TIMEOUT:?}"
        )));
    }

    if timeout > MAX_TIMEOUT {
        return Err(MonitorError::InvalidTimeout(format!(
            "{timeout:?} is longer than the maximum of {MAX_TIMEOUT:?}"
        )));
    }

    Ok(())
}
