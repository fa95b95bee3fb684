use crate::core::SandmanError;
use crate::upgrade::backup::BackupStore;
use crate::upgrade::install::{InstallOutcome, install_artifact};
use crate::upgrade::remote::{DistributionEndpoint, Fetcher};
use crate::upgrade::report::Reporter;
use crate::upgrade::verification::{ArchiveValidator, ChecksumVerifier};
use crate::upgrade::version::{ReleaseInfo, is_content_id};
use crate::utils::fs::{Access, PathAccess, SystemAccess, best_effort, ensure_dir};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flags of a `self-update` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Restore the most recent backup instead of updating
    pub rollback: bool,
    /// Delete existing backups before the swap
    pub clean_backups: bool,
}

/// How an update or rollback ended, when it did not fail fatally.
///
/// Recoverable failures have already been reported to the user. The caller
/// only needs [`exit_code`](Self::exit_code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The new version is live.
    Updated {
        /// Installed version
        version: String,
        /// Backup of the replaced executable, if one could be written
        backup: Option<PathBuf>,
    },
    /// The requested version is the running one. Nothing was downloaded.
    AlreadyUpToDate {
        /// The running version
        version: String,
    },
    /// A backup is live again.
    RolledBack {
        /// Name of the restored backup without suffix
        version: String,
    },
    /// A content identifier other than the latest was requested.
    UnsupportedVersion {
        /// The requested identifier
        version: String,
    },
    /// Nothing usable was downloaded.
    DownloadFailed {
        /// The artifact URL
        url: String,
    },
    /// The candidate failed validation. The live executable is untouched.
    Corrupted {
        /// Why the candidate was rejected
        reason: String,
    },
}

impl UpdateOutcome {
    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Updated {
                ..
            }
            | Self::AlreadyUpToDate {
                ..
            }
            | Self::RolledBack {
                ..
            } => 0,
            Self::UnsupportedVersion {
                ..
            }
            | Self::DownloadFailed {
                ..
            }
            | Self::Corrupted {
                ..
            } => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    ResolvingVersion,
    Downloading,
    Verifying,
    Swapping,
    LocatingBackup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolvingVersion => "resolving version",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Swapping => "validating and swapping",
            Self::LocatingBackup => "locating backup",
        };
        f.write_str(name)
    }
}

/// Core self-update manager for Sandman.
///
/// `SelfUpdater` moves the live executable from the running version to another
/// one (update) or back to the most recent backup (rollback). The live path is
/// never left missing or half-written: new builds are staged next to it,
/// validated, and renamed into place by
/// [`install_artifact`](crate::upgrade::install::install_artifact).
///
/// # Collaborators
///
/// - `F: Fetcher` resolves `/version` and downloads builds
/// - `V: ArchiveValidator` decides whether a candidate is a usable executable
/// - `R: Reporter` receives every user-facing message
///
/// Permission checks go through a [`PathAccess`], [`SystemAccess`] unless
/// replaced with [`with_access`](Self::with_access).
///
/// # Update Flow
///
/// ```text
/// check preconditions → resolve latest → pick target → download to staging
///   → verify checksum → clean backups (optional) → back up live → swap
/// ```
///
/// # Rollback Flow
///
/// ```text
/// check preconditions → locate newest backup → validate → swap
/// ```
///
/// No state survives between invocations.
///
/// # Examples
///
/// ```rust,no_run
/// use sandman::upgrade::SelfUpdater;
/// use sandman::upgrade::UpdateOptions;
/// use sandman::upgrade::remote::{DistributionEndpoint, HttpFetcher};
/// use sandman::upgrade::report::ConsoleReporter;
/// use sandman::upgrade::verification::ExecutableValidator;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let updater = SelfUpdater::new(
///     std::env::current_exe()?,
///     PathBuf::from("/home/me/.sandman"),
///     PathBuf::from("/home/me/.sandman/cache"),
///     DistributionEndpoint::new("dreamfactorysoftware.github.io", true, "sandman"),
///     HttpFetcher::new(Duration::from_secs(60))?,
///     ExecutableValidator,
///     ConsoleReporter::default(),
/// );
///
/// let outcome = updater.run_update(None, UpdateOptions::default()).await?;
/// std::process::exit(outcome.exit_code());
/// # }
/// ```
pub struct SelfUpdater<F, V, R> {
    executable: PathBuf,
    cache_dir: PathBuf,
    backups: BackupStore,
    release: ReleaseInfo,
    endpoint: DistributionEndpoint,
    verify_checksum: bool,
    fetcher: F,
    validator: V,
    reporter: R,
    access: Box<dyn PathAccess>,
}

impl<F, V, R> SelfUpdater<F, V, R>
where
    F: Fetcher,
    V: ArchiveValidator,
    R: Reporter,
{
    /// Create an updater for the executable at `executable`.
    ///
    /// `home` is the rollback directory holding backups. `cache_dir` is the
    /// fallback staging directory used when the executable's own directory is
    /// not writable.
    pub fn new(
        executable: PathBuf,
        home: PathBuf,
        cache_dir: PathBuf,
        endpoint: DistributionEndpoint,
        fetcher: F,
        validator: V,
        reporter: R,
    ) -> Self {
        Self {
            executable,
            cache_dir,
            backups: BackupStore::new(home),
            release: ReleaseInfo::current(),
            endpoint,
            verify_checksum: true,
            fetcher,
            validator,
            reporter,
            access: Box::new(SystemAccess),
        }
    }

    /// Override the metadata of the running build.
    #[must_use]
    pub fn with_release(mut self, release: ReleaseInfo) -> Self {
        self.release = release;
        self
    }

    /// Enable or disable checksum verification of downloads.
    #[must_use]
    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Replace the permission checks made before touching the file system.
    #[must_use]
    pub fn with_access(mut self, access: impl PathAccess + 'static) -> Self {
        self.access = Box::new(access);
        self
    }

    /// Metadata of the running build.
    pub fn release(&self) -> &ReleaseInfo {
        &self.release
    }

    /// The backup store used for rollback.
    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// The network fetch service.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The message sink.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn can(&self, path: &Path, access: Access) -> bool {
        self.access.allows(path, access)
    }

    fn enter(&self, phase: Phase) {
        debug!("self-update: {}", phase);
    }

    /// Update to `requested_version`, or to the latest version when `None`.
    ///
    /// With `options.rollback` set this delegates to [`run_rollback`](Self::run_rollback).
    ///
    /// # Errors
    ///
    /// Fatal conditions are returned as errors: an unwritable staging directory
    /// or executable ([`SandmanError::Filesystem`]), a failure to resolve the
    /// latest version, and unexpected I/O failures during the swap. Recoverable
    /// failures are reported and returned as an [`UpdateOutcome`] with exit code 1.
    pub async fn run_update(
        &self,
        requested_version: Option<&str>,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let staging_dir = self.staging_dir()?;
        if !self.can(&self.executable, Access::Write) {
            return Err(SandmanError::filesystem(
                "update",
                format!("the \"{}\" file could not be written", self.executable.display()),
                &self.executable,
            )
            .into());
        }

        if options.rollback {
            return self.run_rollback();
        }

        self.enter(Phase::ResolvingVersion);
        let latest = self
            .fetcher
            .get(&self.endpoint.version_url())
            .await
            .context("Failed to resolve the latest sandman version")?
            .trim()
            .to_string();
        let target = requested_version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(latest.as_str())
            .to_string();
        debug!("Latest version {}, target {}, running {}", latest, target, self.release.version);

        if is_content_id(&target) && target != latest {
            self.reporter.error(&SandmanError::UnsupportedVersion {
                version: target.clone(),
            }
            .to_string());
            return Ok(UpdateOutcome::UnsupportedVersion {
                version: target,
            });
        }

        if target == self.release.version {
            self.reporter.info(&format!("You are already using sandman version {target}."));
            return Ok(UpdateOutcome::AlreadyUpToDate {
                version: target,
            });
        }

        self.reporter.info(&format!("Updating to version {target}."));

        self.enter(Phase::Downloading);
        ensure_dir(&staging_dir)?;
        let staging = staging_path(&staging_dir, &self.executable);
        let url = self.endpoint.artifact_url(&target);
        if let Err(e) = self.fetcher.download(&url, &staging).await {
            warn!("Download of {} failed: {:#}", url, e);
            best_effort("removal of partial download", || std::fs::remove_file(&staging));
        }

        if !staging.exists() {
            self.reporter.error(&SandmanError::DownloadFailed {
                url: url.clone(),
            }
            .to_string());
            return Ok(UpdateOutcome::DownloadFailed {
                url,
            });
        }

        if self.verify_checksum {
            self.enter(Phase::Verifying);
            if let Some(reason) = self.checksum_mismatch(&target, &staging).await? {
                best_effort("removal of rejected download", || std::fs::remove_file(&staging));
                return Ok(self.report_corrupted(reason));
            }
        }

        if options.clean_backups
            && let Err(e) = self.backups.clean(&self.reporter)
        {
            warn!("Failed to clean backups: {:#}", e);
        }

        let backup = self.backups.backup_path(&self.release);
        best_effort("creation of rollback directory", || ensure_dir(self.backups.dir()));

        self.enter(Phase::Swapping);
        let installed =
            match install_artifact(&self.executable, &staging, Some(&backup), &self.validator) {
                Ok(outcome) => outcome,
                Err(e) => {
                    best_effort("removal of staged download", || std::fs::remove_file(&staging));
                    return Err(e);
                }
            };
        if let InstallOutcome::Rejected(err) = installed {
            return Ok(self.report_corrupted(SandmanError::ArchiveValidation(err).to_string()));
        }

        info!("Updated sandman from {} to {}", self.release.version, target);
        let backup = if backup.exists() {
            self.reporter.info(&format!(
                "Use `sandman self-update --rollback` to return to version {}",
                self.release.version
            ));
            Some(backup)
        } else {
            self.reporter.warn(&format!(
                "A backup of the current version could not be written to {}, no rollback possible",
                backup.display()
            ));
            None
        };

        Ok(UpdateOutcome::Updated {
            version: target,
            backup,
        })
    }

    /// Restore the most recent backup over the live executable.
    ///
    /// The restored backup is moved, not copied, and no new backup is written.
    ///
    /// # Errors
    ///
    /// [`SandmanError::NoRollbackAvailable`] when there is no backup, and
    /// [`SandmanError::Filesystem`] when the rollback directory is not writable
    /// or the selected backup is missing or unreadable.
    pub fn run_rollback(&self) -> Result<UpdateOutcome> {
        self.enter(Phase::LocatingBackup);
        let dir = self.backups.dir();
        let Some(version) = self.backups.latest()? else {
            return Err(SandmanError::NoRollbackAvailable {
                dir: dir.display().to_string(),
            }
            .into());
        };

        if !self.can(dir, Access::Write) {
            return Err(SandmanError::filesystem(
                "rollback",
                format!("the \"{}\" dir could not be written to", dir.display()),
                dir,
            )
            .into());
        }

        let old = self.backups.path_for(&version);
        if !old.is_file() {
            return Err(SandmanError::filesystem(
                "rollback",
                format!("\"{}\" could not be found", old.display()),
                &old,
            )
            .into());
        }
        if !self.can(&old, Access::Read) {
            return Err(SandmanError::filesystem(
                "rollback",
                format!("\"{}\" could not be read", old.display()),
                &old,
            )
            .into());
        }

        self.reporter.info(&format!("Rolling back to version {version}."));

        self.enter(Phase::Swapping);
        match install_artifact(&self.executable, &old, None, &self.validator)? {
            InstallOutcome::Installed => {
                info!("Rolled back to {}", version);
                Ok(UpdateOutcome::RolledBack {
                    version,
                })
            }
            InstallOutcome::Rejected(err) => {
                let reason = SandmanError::ArchiveValidation(err).to_string();
                self.reporter.error(&format!("The backup file was corrupted ({reason})."));
                Ok(UpdateOutcome::Corrupted {
                    reason,
                })
            }
        }
    }

    /// Directory for the staging file: next to the executable when possible,
    /// else the cache directory.
    ///
    /// Nothing is created here. A cache directory that does not exist yet is
    /// usable when its nearest existing ancestor is writable, and is created
    /// by [`run_update`](Self::run_update) once every precondition holds.
    fn staging_dir(&self) -> Result<PathBuf> {
        let exe_dir = self
            .executable
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        if self.can(exe_dir, Access::Write) {
            return Ok(exe_dir.to_path_buf());
        }

        let dir = &self.cache_dir;
        let existing = dir.ancestors().find(|p| p.exists()).unwrap_or(dir);
        if !self.can(existing, Access::Write) {
            return Err(SandmanError::filesystem(
                "update",
                format!(
                    "the \"{}\" directory used to download the temp file could not be written",
                    dir.display()
                ),
                dir,
            )
            .into());
        }

        Ok(dir.clone())
    }

    /// Compare the staged build with its published checksum.
    ///
    /// Returns why verification failed, or `None` when the checksum matches or
    /// the server answers that none is published. Any other fetch failure
    /// fails the verification.
    async fn checksum_mismatch(&self, version: &str, staging: &Path) -> Result<Option<String>> {
        let url = self.endpoint.checksum_url(version);
        let document = match self.fetcher.get(&url).await {
            Ok(document) => document,
            Err(e) if is_not_found(&e) => {
                warn!("No checksum published at {}, skipping verification", url);
                return Ok(None);
            }
            Err(e) => {
                return Ok(Some(format!("the checksum at {url} could not be fetched: {e:#}")));
            }
        };

        let artifact = self.endpoint.artifact_name();
        let Some(expected) = ChecksumVerifier::parse_checksum(&document, artifact) else {
            warn!("Checksum document at {} has no entry for {}, skipping", url, artifact);
            return Ok(None);
        };

        Ok(ChecksumVerifier::verify(staging, &expected).await?.err().map(|actual| {
            SandmanError::ChecksumMismatch {
                name: artifact.to_string(),
                expected,
                actual,
            }
            .to_string()
        }))
    }

    fn report_corrupted(&self, reason: String) -> UpdateOutcome {
        self.reporter.error(&format!("The file is corrupted ({reason})."));
        self.reporter.error("Please re-run the self-update command to try again.");
        UpdateOutcome::Corrupted {
            reason,
        }
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<SandmanError>(), Some(SandmanError::NotFound { .. }))
}

/// Staging path for a download replacing `executable`:
/// `<dir>/<stem>-temp<.ext>`.
pub(crate) fn staging_path(dir: &Path, executable: &Path) -> PathBuf {
    let stem = executable
        .file_stem()
        .map_or_else(|| "sandman".into(), |s| s.to_string_lossy());
    let name = match executable.extension() {
        Some(ext) => format!("{}-temp.{}", stem, ext.to_string_lossy()),
        None => format!("{stem}-temp"),
    };
    dir.join(name)
}
