//! Version identifiers and release metadata of the running build.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

/// Format of [`ReleaseInfo::release_date`].
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed-width timestamp embedded in backup names. Lexicographic order of this
/// format is chronological order.
pub const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const DEFAULT_RELEASE_DATE: &str = "1970-01-01 00:00:00";

static CONTENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{40}$").expect("content id pattern is valid")
});

/// Whether `version` is a 40-character hexadecimal content identifier.
///
/// Content identifiers name one specific build. They can only be installed when
/// they are the current latest build.
#[must_use]
pub fn is_content_id(version: &str) -> bool {
    CONTENT_ID.is_match(version)
}

/// Short form of a version used in backup names: the first 7 characters of a
/// content identifier, any other version unchanged.
#[must_use]
pub fn short_version(version: &str) -> &str {
    if is_content_id(version) { &version[..7] } else { version }
}

/// Metadata of a build: its version identifier and release timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Tag or content identifier
    pub version: String,
    /// Release timestamp, `YYYY-MM-DD HH:MM:SS`
    pub release_date: String,
}

impl ReleaseInfo {
    /// Create release metadata from explicit values.
    pub fn new(version: impl Into<String>, release_date: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            release_date: release_date.into(),
        }
    }

    /// Metadata of the running executable.
    ///
    /// Release builds stamp `SANDMAN_PACKAGE_VERSION` and `SANDMAN_RELEASE_DATE` at
    /// compile time. Development builds fall back to the crate version and the epoch.
    #[must_use]
    pub fn current() -> Self {
        Self::new(
            option_env!("SANDMAN_PACKAGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
            option_env!("SANDMAN_RELEASE_DATE").unwrap_or(DEFAULT_RELEASE_DATE),
        )
    }

    /// The release timestamp in backup-name form (`YYYY-MM-DD_HH-MM-SS`).
    ///
    /// Dates that do not parse are mapped character by character (space to
    /// underscore, colon to hyphen) so an odd stamp still yields a usable name.
    #[must_use]
    pub fn backup_stamp(&self) -> String {
        match NaiveDateTime::parse_from_str(self.release_date.trim(), RELEASE_DATE_FORMAT) {
            Ok(date) => date.format(BACKUP_STAMP_FORMAT).to_string(),
            Err(_) => self.release_date.replace(' ', "_").replace(':', "-"),
        }
    }
}
