use std::env::var;
use std::io::stderr;
use std::str::FromStr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Output layout of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Initialize tracing with an explicit default level. Logs go to stderr.
///
/// `RUST_LOG` still takes precedence over `level`. When `format` is `None`
/// the layout comes from `RUST_LOG_FORMAT`, falling back to compact.
pub fn init_with(level: LevelFilter, format: Option<LogFormat>) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let format = format.unwrap_or_else(format_from_env);

    // stdout belongs to the check reports
    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(stderr)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(stderr)
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).try_init()
}

fn format_from_env() -> LogFormat {
    let raw = var("RUST_LOG_FORMAT").unwrap_or_default();
    raw.parse()
        .inspect_err(|error| warn!("Ignoring RUST_LOG_FORMAT, falling back to compact: {error}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert_eq!("".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_second_init_is_rejected_not_panicking() {
        let _ = init_with(LevelFilter::WARN, Some(LogFormat::Compact));
        assert!(init_with(LevelFilter::WARN, Some(LogFormat::Compact)).is_err());
    }
}
