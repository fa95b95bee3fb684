//! Shared helpers for unit and integration tests.
//!
//! Available under `cfg(test)` and with the `test-utils` feature, which the
//! crate enables for its own integration tests.

use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging once per process.
///
/// With `Some(level)` that level is used. Otherwise logging is only enabled
/// when `RUST_LOG` is set.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Bytes of a minimal ELF executable whose contents carry `tag`.
///
/// Passes header validation and lets tests tell builds apart by content.
#[must_use]
pub fn fake_executable(tag: &str) -> Vec<u8> {
    let mut bytes = b"\x7fELF".to_vec();
    bytes.extend_from_slice(tag.as_bytes());
    bytes.resize(bytes.len().max(96), 0);
    bytes
}

/// A throwaway Sandman installation: an executable, a home directory and a
/// cache directory, all inside one temp directory.
pub struct TestInstallation {
    _temp: TempDir,
    /// The executable to update
    pub executable: PathBuf,
    /// Rollback directory
    pub home: PathBuf,
    /// Fallback staging directory
    pub cache: PathBuf,
}

impl TestInstallation {
    /// Create the directories and write `fake_executable(tag)` as the executable.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory cannot be prepared.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let bin = temp.path().join("bin");
        let home = temp.path().join("home");
        let cache = temp.path().join("cache");
        for dir in [&bin, &home, &cache] {
            std::fs::create_dir_all(dir).expect("Failed to create test directory");
        }

        let executable = bin.join("sandman");
        std::fs::write(&executable, fake_executable(tag)).expect("Failed to write executable");

        Self {
            _temp: temp,
            executable,
            home,
            cache,
        }
    }

    /// Write a backup named `<stem>-old.bin` holding `fake_executable(tag)`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn add_backup(&self, stem: &str, tag: &str) -> PathBuf {
        let path = self.home.join(format!("{stem}-old.bin"));
        std::fs::write(&path, fake_executable(tag)).expect("Failed to write backup");
        path
    }

    /// Contents of the executable.
    ///
    /// # Panics
    ///
    /// Panics if the executable cannot be read.
    #[must_use]
    pub fn executable_contents(&self) -> Vec<u8> {
        read(&self.executable)
    }
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}
