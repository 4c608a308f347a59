use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// `sitewatch [--config PATH] [--interval SECS] [--timeout SECS] [--json] [TARGET...] [COMMAND]`
///
/// Flags are accepted before or after the command, and targets may be given
/// on either side of it.
#[derive(Parser, Debug)]
#[command(
    name = "sitewatch",
    version,
    about = "Keep checking a list of sites and report their status",
    subcommand_precedence_over_arg = true
)]
pub struct Cli {
    /// Config file, defaults to $XDG_CONFIG_HOME/sitewatch/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Command to run, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Overrides from the whole command line, targets from both sides of the command
    pub fn overrides(&self) -> Overrides {
        let mut overrides = self.overrides.clone();
        if let Some(Commands::Run(sites) | Commands::Once(sites)) = &self.command {
            overrides.targets.extend(sites.targets.iter().cloned());
        }
        overrides
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check sites until interrupted (default)
    Run(Sites),
    /// Check every site once and exit, non-zero if any is not up
    Once(Sites),
    /// Print the effective configuration
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run(Sites::default())
    }
}

/// Values replacing the ones from the config file
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Seconds between two checks of the same site
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Print one JSON object per check instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Sites to check, replacing the configured list
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}

/// Sites given after the command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Sites {
    /// Sites to check, replacing the configured list
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}
