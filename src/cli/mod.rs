//! Command-line interface for Sandman.
//!
//! Sandman is driven through clap's derive API. Global flags control logging
//! and the configuration file location. Each subcommand lives in its own
//! module and returns the process exit code.
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: only errors are printed
//! - `--config` / `-c`: custom global config path (also `SANDMAN_CONFIG`)
//!
//! `RUST_LOG` overrides the log level derived from these flags.

mod self_update;


use crate::config::GlobalConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use self_update::SelfUpdateCommand;

/// Runtime configuration derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Suppress everything except errors
    pub quiet: bool,
    /// Explicit global config file
    pub config_path: Option<PathBuf>,
}

/// Main CLI structure for Sandman.
#[derive(Parser, Debug)]
#[command(
    name = "sandman",
    about = "Sandman - command-line tool with built-in self-update",
    version,
    author
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output with debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the global configuration file
    #[arg(short, long, global = true, env = "SANDMAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update sandman to the latest version, or roll back to the previous one
    #[command(name = "self-update", visible_alias = "selfupdate")]
    SelfUpdate(SelfUpdateCommand),
}

impl Cli {
    /// Execute the parsed command and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns fatal errors from configuration loading or the command itself.
    /// Recoverable failures are reported by the command and surface as a
    /// non-zero exit code instead.
    pub async fn execute(self) -> Result<i32> {
        let config = self.build_config();
        init_logging(&config);

        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;

        match self.command {
            Commands::SelfUpdate(cmd) => cmd.execute(&global, &config).await,
        }
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }
}

/// Install the global tracing subscriber. Later calls are ignored.
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sandman={}", config.log_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
