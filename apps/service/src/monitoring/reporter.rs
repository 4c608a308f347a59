//! Sinks for check results.
//!
//! Every completed check is handed to exactly one [`Reporter`]; use
//! [`Fanout`] to feed several.

use std::io::Write;
use std::sync::Arc;

use tracing::{info, warn};

use super::types::{CheckResult, Status};

/// Receives every check result. Called from checker tasks, so it must be
/// cheap and must not block.
pub trait Reporter: Send + Sync {
    fn report(&self, result: &CheckResult);
}

impl<F> Reporter for F
where
    F: Fn(&CheckResult) + Send + Sync,
{
    fn report(&self, result: &CheckResult) {
        self(result)
    }
}

/// How [`ConsoleReporter`] renders a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes one line per result to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    format: OutputFormat,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a result without a trailing newline
    pub fn render(&self, result: &CheckResult) -> String {
        match self.format {
            OutputFormat::Text => {
                format!("Site {:?} has status {:?}", result.target.as_str(), result.status.to_string())
            }
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_else(|e| {
                format!(r#"{{"target":{:?},"error":"unserializable result: {e}"}}"#, result.target.as_str())
            }),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, result: &CheckResult) {
        let line = self.render(result);
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{line}") {
            warn!("Failed to write report for {}: {}", result.target, e);
        }
    }
}

/// Emits a tracing event per result
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, result: &CheckResult) {
        match result.status {
            Status::Up => info!(
                site = %result.target,
                status = %result.status,
                latency_ms = ?result.latency_ms,
                "Check completed"
            ),
            Status::Down => warn!(
                site = %result.target,
                status = %result.status,
                status_code = ?result.status_code,
                "Check completed"
            ),
            Status::Error => warn!(
                site = %result.target,
                status = %result.status,
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "Check completed"
            ),
        }
    }
}

/// Forwards each result to several reporters, in order
#[derive(Default)]
pub struct Fanout {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl Fanout {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn push(&mut self, reporter: Arc<dyn Reporter>) {
        self.reporters.push(reporter);
    }
}

impl Reporter for Fanout {
    fn report(&self, result: &CheckResult) {
        for reporter in &self.reporters {
            reporter.report(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::types::Target;
    use parking_lot::Mutex;

    #[test]
    fn test_text_rendering() {
        let reporter = ConsoleReporter::default();
        let result = CheckResult::up(Target::from("https://golang.org"), 10, 200);

        assert_eq!(reporter.render(&result), r#"Site "https://golang.org" has status "up""#);
    }

    #[test]
    fn test_json_rendering_is_single_line() {
        let reporter = ConsoleReporter::new(OutputFormat::Json);
        let result = CheckResult::error(Target::from("https://nope.invalid"), "dns error");

        let line = reporter.render(&result);
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_message"], "dns error");
    }

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn log_at_info(result: &CheckResult) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || LogReporter.report(result));

        let bytes = captured.0.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_log_reporter_levels() {
        let up = log_at_info(&CheckResult::up(Target::from("https://a.example"), 3, 200));
        assert!(up.contains("INFO"), "{up}");
        assert!(up.contains("Check completed"));

        let down = log_at_info(&CheckResult::down(Target::from("https://a.example"), 3, 503));
        assert!(down.contains("WARN"), "{down}");

        let error = log_at_info(&CheckResult::error(Target::from("https://a.example"), "refused"));
        assert!(error.contains("WARN"), "{error}");
        assert!(error.contains("refused"));
    }

    #[test]
    fn test_fanout_reaches_every_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = seen.clone();
            move |r: &CheckResult| seen.lock().push(format!("first:{}", r.status))
        };
        let second = {
            let seen = seen.clone();
            move |r: &CheckResult| seen.lock().push(format!("second:{}", r.status))
        };

        let fanout = Fanout::new(vec![Arc::new(first), Arc::new(second)]);
        fanout.report(&CheckResult::new(Target::from("a"), Status::Down));

        assert_eq!(*seen.lock(), vec!["first:down", "second:down"]);
    }
}
