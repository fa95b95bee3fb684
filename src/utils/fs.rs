//! File system helpers used by the self-update subsystem
//!
//! The update path needs a handful of operations that the standard library either
//! does not offer directly or that must never abort the update when they fail:
//!
//! - [`is_writable`] / [`is_readable`]: access checks with `access(2)` semantics on Unix
//! - [`PathAccess`]: the same checks behind a trait, so callers can substitute them
//! - [`best_effort`]: run a fallible side operation, log and discard its failure
//! - [`set_executable_permissions`]: `0o777 & !umask`, the mode a fresh executable gets
//! - [`ensure_dir`]: create a directory tree if it is missing
//!
//! # Examples
//!
//! ```rust,no_run
//! use sandman::utils::fs::{best_effort, is_writable};
//! use std::path::Path;
//!
//! let dir = Path::new("/usr/local/bin");
//! if is_writable(dir) {
//!     best_effort("remove stale file", || std::fs::remove_file(dir.join("sandman-temp")));
//! }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or if the
/// directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Run a side operation whose failure must never escalate.
///
/// Backup copies, permission changes and backup cleanup are a safety net, not a
/// correctness requirement. The error is logged at debug level and dropped.
/// Returns `true` when the operation succeeded.
pub fn best_effort<T, E, F>(operation: &str, f: F) -> bool
where
    F: FnOnce() -> std::result::Result<T, E>,
    E: std::fmt::Display,
{
    match f() {
        Ok(_) => true,
        Err(e) => {
            debug!("Ignoring failed {}: {}", operation, e);
            false
        }
    }
}

/// Whether the current process may write to `path`.
///
/// A missing path is not writable.
#[must_use]
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        access(path, AccessFlags::W_OK).is_ok()
    }

    #[cfg(not(unix))]
    {
        fs::metadata(path).map(|m| !m.permissions().readonly()).unwrap_or(false)
    }
}

/// Whether the current process may read `path`.
#[must_use]
pub fn is_readable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        access(path, AccessFlags::R_OK).is_ok()
    }

    #[cfg(not(unix))]
    {
        fs::File::open(path).is_ok()
    }
}

/// Kind of access asked of a [`PathAccess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open for reading
    Read,
    /// Create, replace or modify
    Write,
}

/// Permission checks performed before the update path touches a file.
pub trait PathAccess {
    /// Whether the current process has `access` to `path`.
    fn allows(&self, path: &Path, access: Access) -> bool;
}

/// [`PathAccess`] answered by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccess;

impl PathAccess for SystemAccess {
    fn allows(&self, path: &Path, access: Access) -> bool {
        match access {
            Access::Read => is_readable(path),
            Access::Write => is_writable(path),
        }
    }
}

/// Give `path` the mode a freshly installed executable would get: `0o777 & !umask`.
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed. Callers in the update
/// path wrap this in [`best_effort`].
#[cfg(unix)]
pub fn set_executable_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o777 & !current_umask()))
}

/// No-op on platforms without Unix permission bits.
#[cfg(not(unix))]
pub fn set_executable_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Read the process umask.
///
/// `umask(2)` can only be read by setting it, so the old value is restored
/// immediately. The umask is process-wide: tests reaching this run `#[serial]`.
#[cfg(unix)]
fn current_umask() -> u32 {
    use nix::sys::stat::{Mode, umask};

    let previous = umask(Mode::empty());
    let _ = umask(previous);
    u32::from(previous.bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Idempotent
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, b"x").unwrap();

        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("missing");

        assert!(!best_effort("remove", || fs::remove_file(&missing)));
        assert!(best_effort("write", || fs::write(&missing, b"ok")));
        assert!(missing.exists());
    }

    #[test]
    fn test_missing_path_is_not_writable() {
        let temp = tempdir().unwrap();
        assert!(is_writable(temp.path()));
        assert!(!is_writable(&temp.path().join("nope")));
        assert!(!is_readable(&temp.path().join("nope")));
    }

    #[test]
    fn test_system_access_matches_helpers() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, b"x").unwrap();

        assert!(SystemAccess.allows(&file, Access::Read));
        assert!(SystemAccess.allows(temp.path(), Access::Write));
        assert!(!SystemAccess.allows(&temp.path().join("nope"), Access::Read));
        assert!(!SystemAccess.allows(&temp.path().join("nope"), Access::Write));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_set_executable_permissions_respects_umask() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let file = temp.path().join("bin");
        fs::write(&file, b"#!/bin/sh\n").unwrap();

        set_executable_permissions(&file).unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & 0o700, 0o700, "owner should keep read, write and execute");
    }
}
