use std::{env, fmt, fs, path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MonitorError;
use crate::monitoring::reporter::OutputFormat;
use crate::monitoring::types::Target;
use crate::monitoring::validation::{validate_check_interval, validate_targets, validate_timeout};
use crate::monitoring::{Backoff, RetryPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: Monitor,
    pub probe: Probe,
    pub backoff: BackoffSettings,
    pub history: History,
    pub output: Output,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub targets: Vec<String>,
    pub interval_seconds: u64,
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub enabled: bool,
    pub multiplier: u32,
    pub max_interval_seconds: u64,
    pub jitter_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct History {
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    /// `compact` or `json`; empty defers to `RUST_LOG_FORMAT`
    pub format: String,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            targets: [
                "https://google.com",
                "https://facebook.com",
                "https://stackoverflow.com",
                "https://golang.org",
                "https://amazon.com",
            ]
            .map(String::from)
            .to_vec(),
            interval_seconds: 5,
            shutdown_grace_seconds: 15,
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self { timeout_seconds: 10, user_agent: None }
    }
}

impl Default for BackoffSettings {
    fn default() -> Self {
        let backoff = Backoff::default();
        Self {
            enabled: false,
            multiplier: backoff.multiplier,
            max_interval_seconds: backoff.max_interval.as_secs(),
            jitter_millis: 0,
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self { format: ReportFormat::Text }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".into(), format: String::new() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: Monitor::default(),
            probe: Probe::default(),
            backoff: BackoffSettings::default(),
            history: History::default(),
            output: Output::default(),
            logging: Logging::default(),
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/sitewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("sitewatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Interval (s)", &self.monitor.interval_seconds)?;
        write_1(f, "Shutdown Grace (s)", &self.monitor.shutdown_grace_seconds)?;
        write_1(f, "Targets", &self.monitor.targets.len())?;
        for target in &self.monitor.targets {
            write_2(f, "-", target)?;
        }
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (s)", &self.probe.timeout_seconds)?;
        write_1(f, "User Agent", &self.probe.user_agent.as_deref().unwrap_or("(default)"))?;
        write_title_1(f, "Backoff")?;
        write_1(f, "Enabled", &self.backoff.enabled)?;
        write_1(f, "Multiplier", &self.backoff.multiplier)?;
        write_1(f, "Max Interval (s)", &self.backoff.max_interval_seconds)?;
        write_1(f, "Jitter (ms)", &self.backoff.jitter_millis)?;
        write_title_1(f, "History")?;
        write_1(f, "Capacity", &self.history.capacity)?;
        write_title_1(f, "Output")?;
        write_1(f, "Format", &format!("{:?}", self.output.format).to_lowercase())?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        let log_format =
            if self.logging.format.is_empty() { "(env)" } else { self.logging.format.as_str() };
        write_1(f, "Format", &log_format)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/sitewatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// let cfg = sitewatch::config::Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), sitewatch::config::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())
                .map_err(|source| ConfigError::ParseFailed { path: config_path, source })
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), MonitorError> {
        validate_targets(self.monitor.targets.iter().map(String::as_str))?;
        validate_check_interval(self.interval())?;
        validate_timeout(self.probe_timeout())
    }

    pub fn targets(&self) -> Vec<Target> {
        self.monitor.targets.iter().cloned().map(Target::from).collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_seconds)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.monitor.shutdown_grace_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::fixed(self.interval())
            .with_jitter(Duration::from_millis(self.backoff.jitter_millis));

        if self.backoff.enabled {
            policy = policy.with_backoff(Backoff {
                multiplier: self.backoff.multiplier,
                max_interval: Duration::from_secs(self.backoff.max_interval_seconds),
            });
        }

        policy
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.output.format {
            ReportFormat::Text => OutputFormat::Text,
            ReportFormat::Json => OutputFormat::Json,
        }
    }
}
