//! Global configuration management for Sandman.
//!
//! The global configuration lives in the Sandman home directory and holds
//! user-wide settings: where backups are kept, where downloads are staged when
//! the executable's own directory is read-only, and how self-update talks to the
//! distribution server.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.sandman/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\sandman\config.toml`
//! - **Override**: `--config <PATH>` or `SANDMAN_CONFIG`
//!
//! # File Format
//!
//! ```toml
//! home = "/home/me/.sandman"
//! cache_dir = "/home/me/.sandman/cache"
//!
//! [upgrade]
//! distribution_host = "dreamfactorysoftware.github.io"
//! secure = true
//! http_timeout_secs = 60
//! verify_checksum = true
//! ```
//!
//! # Environment Overrides
//!
//! `SANDMAN_HOME` and `SANDMAN_CACHE_DIR` take precedence over the file.

use crate::core::SandmanError;
use crate::upgrade::config::UpgradeConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Environment variable overriding the rollback directory.
pub const HOME_ENV: &str = "SANDMAN_HOME";

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "SANDMAN_CACHE_DIR";

/// Global Sandman configuration.
///
/// Every field is optional in the file. Unset directories resolve to the
/// platform defaults through [`home_dir`](Self::home_dir) and
/// [`cache_dir`](Self::cache_dir).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Sandman home, which is also the rollback directory holding backups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// Staging directory used when the executable's directory is not writable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Self-update settings.
    #[serde(default)]
    pub upgrade: UpgradeConfig,
}

impl GlobalConfig {
    /// Load the configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the default configuration. Environment overrides
    /// are applied either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, or if the
    /// file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            Self::load_from(&path).await?
        } else {
            debug!("No config at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the configuration from a specific file, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .map_err(SandmanError::from)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Default Sandman home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or, on Windows, local data) directory
    /// cannot be determined.
    pub fn default_home() -> Result<PathBuf> {
        if cfg!(target_os = "windows") {
            Ok(dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("sandman"))
        } else {
            Ok(dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".sandman"))
        }
    }

    /// Default location of the configuration file.
    ///
    /// # Errors
    ///
    /// See [`default_home`](Self::default_home).
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_home()?.join("config.toml"))
    }

    /// Resolved rollback directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no home is configured and the default cannot be determined.
    pub fn home_dir(&self) -> Result<PathBuf> {
        match &self.home {
            Some(home) => Ok(home.clone()),
            None => Self::default_home(),
        }
    }

    /// Resolved cache directory, `<home>/cache` unless configured.
    ///
    /// # Errors
    ///
    /// See [`home_dir`](Self::home_dir).
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.home_dir()?.join("cache")),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(home) = env_path(HOME_ENV) {
            debug!("{} overrides home: {:?}", HOME_ENV, home);
            self.home = Some(home);
        }
        if let Some(dir) = env_path(CACHE_DIR_ENV) {
            debug!("{} overrides cache dir: {:?}", CACHE_DIR_ENV, dir);
            self.cache_dir = Some(dir);
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}
