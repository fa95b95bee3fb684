//! The `self-update` command.
//!
//! ```bash
//! sandman self-update                  # latest build
//! sandman self-update 1.4.0            # specific tag
//! sandman self-update --clean-backups  # drop old backups after downloading
//! sandman self-update --rollback       # restore the newest backup
//! ```

use crate::cli::CliConfig;
use crate::config::GlobalConfig;
use crate::upgrade::remote::{DistributionEndpoint, HttpFetcher};
use crate::upgrade::report::ConsoleReporter;
use crate::upgrade::verification::ExecutableValidator;
use crate::upgrade::{SelfUpdater, UpdateOptions};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Arguments of `sandman self-update`.
#[derive(Args, Debug, Clone, Default)]
pub struct SelfUpdateCommand {
    /// Version to update to (defaults to the latest)
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,

    /// Revert to the most recently installed version
    #[arg(short, long)]
    pub rollback: bool,

    /// Delete old backups during an update, making the current version the only
    /// backup available
    #[arg(long)]
    pub clean_backups: bool,

    /// Executable to replace instead of the running one
    #[arg(long, hide = true, env = "SANDMAN_SELF_PATH")]
    pub executable: Option<PathBuf>,
}

impl SelfUpdateCommand {
    /// Run the update or rollback and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns fatal errors: unwritable paths, no backup to roll back to, or
    /// failure to resolve the latest version.
    pub async fn execute(self, global: &GlobalConfig, cli: &CliConfig) -> Result<i32> {
        let executable = match self.executable {
            Some(path) => path,
            None => std::env::current_exe().context("Failed to get current executable path")?,
        };
        debug!("Self-update target executable: {:?}", executable);

        let upgrade = &global.upgrade;
        let fetcher = HttpFetcher::new(Duration::from_secs(upgrade.http_timeout_secs))?;

        let updater = SelfUpdater::new(
            executable,
            global.home_dir()?,
            global.cache_dir()?,
            DistributionEndpoint::from_config(upgrade),
            fetcher,
            ExecutableValidator,
            ConsoleReporter::new(cli.quiet),
        )
        .verify_checksum(upgrade.verify_checksum);

        let options = UpdateOptions {
            rollback: self.rollback,
            clean_backups: self.clean_backups,
        };

        let outcome = updater.run_update(self.version.as_deref(), options).await?;
        debug!("Self-update finished: {:?}", outcome);
        Ok(outcome.exit_code())
    }
}
