//! The swap primitive shared by update and rollback.
//!
//! A running executable must never be opened for writing. The candidate is staged
//! at a separate path on the same volume, validated, and then renamed over the
//! live path. The rename is atomic, so the live path always holds either the old
//! or the new executable.

use crate::upgrade::verification::{ArchiveError, ArchiveValidator, ValidateError};
use crate::utils::fs::{best_effort, set_executable_permissions};
use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of [`install_artifact`] when no unexpected error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The candidate now occupies the live path.
    Installed,
    /// The candidate failed validation. The live path is untouched.
    Rejected(ArchiveError),
}

/// Replace `live` with `candidate` after validating the candidate.
///
/// 1. The candidate gets executable permissions (best-effort).
/// 2. The candidate is validated. A structural failure is returned as
///    [`InstallOutcome::Rejected`]. When a `backup_target` was requested, the
///    rejected candidate is also deleted (best-effort), because it is a download
///    and not a backup that must be kept.
/// 3. If `backup_target` is given and `live` exists, `live` is copied there
///    (best-effort; a missing backup never blocks the swap).
/// 4. The candidate is renamed over `live`.
///
/// # Errors
///
/// I/O failures other than archive-format errors (unreadable candidate, failed
/// rename) are returned as `Err` and abort the whole operation.
pub fn install_artifact(
    live: &Path,
    candidate: &Path,
    backup_target: Option<&Path>,
    validator: &impl ArchiveValidator,
) -> Result<InstallOutcome> {
    ensure!(candidate != live, "Candidate {} is the live executable", candidate.display());
    if let Some(backup) = backup_target {
        ensure!(backup != live, "Backup target {} is the live executable", backup.display());
    }

    best_effort("permission change", || set_executable_permissions(candidate));

    debug!("Validating {:?}", candidate);
    match validator.validate(candidate) {
        Ok(()) => {}
        Err(ValidateError::Archive(err)) => {
            warn!("Rejected {:?}: {}", candidate, err);
            if backup_target.is_some() {
                best_effort("removal of rejected candidate", || fs::remove_file(candidate));
            }
            return Ok(InstallOutcome::Rejected(err));
        }
        Err(ValidateError::Io(e)) => {
            return Err(e).with_context(|| format!("Failed to validate {}", candidate.display()));
        }
    }

    if let Some(backup) = backup_target
        && live.exists()
    {
        debug!("Backing up {:?} to {:?}", live, backup);
        best_effort("backup copy", || fs::copy(live, backup));
    }

    fs::rename(candidate, live).with_context(|| {
        format!("Failed to move {} to {}", candidate.display(), live.display())
    })?;

    info!("Installed {:?} as {:?}", candidate, live);
    Ok(InstallOutcome::Installed)
}
