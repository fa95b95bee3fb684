use crate::upgrade::report::Reporter;
use crate::upgrade::version::{ReleaseInfo, short_version};
use crate::utils::fs::best_effort;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Literal suffix of every backup file. It keeps backups apart from the live
/// executable and from the staging file.
pub const BACKUP_SUFFIX: &str = "-old.bin";

/// Retained copies of previously installed executables.
///
/// Backups live as files directly inside the rollback directory and are named
/// `<timestamp>-<short version>-old.bin`, where the timestamp is the release date
/// of the build that was replaced, in `YYYY-MM-DD_HH-MM-SS` form. Because that
/// format is fixed-width, sorting file names sorts backups by age, and the
/// greatest name is the most recent backup.
///
/// ```text
/// ~/.sandman/
/// ├── 2023-01-01_00-00-00-abc1234-old.bin
/// └── 2024-06-01_12-00-00-1.4.0-old.bin     <- rollback target
/// ```
///
/// Backups are written by the swap in
/// [`install_artifact`](crate::upgrade::install::install_artifact), never by this
/// type. They disappear only when `--clean-backups` is used, when a rollback
/// consumes one, or when they are deleted by hand.
///
/// # Examples
///
/// ```rust,no_run
/// use sandman::upgrade::backup::BackupStore;
/// use sandman::upgrade::version::ReleaseInfo;
/// use std::path::PathBuf;
///
/// # fn example() -> anyhow::Result<()> {
/// let store = BackupStore::new(PathBuf::from("/home/me/.sandman"));
///
/// let target = store.backup_path(&ReleaseInfo::current());
/// println!("Backup will be written to {}", target.display());
///
/// if let Some(version) = store.latest()? {
///     println!("Rollback would restore {version}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    /// Create a store rooted at the rollback directory.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
        }
    }

    /// The rollback directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the backup that replacing `release` would produce.
    #[must_use]
    pub fn backup_name(release: &ReleaseInfo) -> String {
        format!(
            "{}-{}{}",
            release.backup_stamp(),
            short_version(&release.version),
            BACKUP_SUFFIX
        )
    }

    /// Full path of the backup that replacing `release` would produce.
    #[must_use]
    pub fn backup_path(&self, release: &ReleaseInfo) -> PathBuf {
        self.dir.join(Self::backup_name(release))
    }

    /// Path of the backup whose name without suffix is `stem`.
    #[must_use]
    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}{BACKUP_SUFFIX}"))
    }

    /// All backup files, sorted by name (oldest first).
    ///
    /// A missing rollback directory holds no backups. Directories are skipped,
    /// but a link whose target is gone is still listed.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let escaped = glob::Pattern::escape(&self.dir.to_string_lossy());
        let pattern = Path::new(&escaped).join(format!("*{BACKUP_SUFFIX}"));
        let pattern = pattern.to_string_lossy();

        let mut files = Vec::new();
        for entry in
            glob::glob(&pattern).with_context(|| format!("Invalid backup pattern: {pattern}"))?
        {
            let path =
                entry.with_context(|| format!("Failed to read backups matching {pattern}"))?;
            if !path.is_dir() {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!("Found {} backup(s) in {:?}", files.len(), self.dir);
        Ok(files)
    }

    /// Name (without suffix) of the most recent backup, if any.
    pub fn latest(&self) -> Result<Option<String>> {
        Ok(self.list()?.last().and_then(|path| {
            path.file_name().map(|name| {
                let name = name.to_string_lossy();
                name.strip_suffix(BACKUP_SUFFIX).unwrap_or(&name).to_string()
            })
        }))
    }

    /// Remove every backup, reporting each one. Individual failures are ignored.
    ///
    /// Returns the number of files actually removed.
    pub fn clean(&self, reporter: &impl Reporter) -> Result<usize> {
        let mut removed = 0;
        for file in self.list()? {
            reporter.info(&format!("Removing: {}", file.display()));
            if best_effort("backup removal", || std::fs::remove_file(&file)) {
                removed += 1;
            }
        }

        info!("Removed {} backup(s) from {:?}", removed, self.dir);
        Ok(removed)
    }
}
