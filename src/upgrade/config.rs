use serde::{Deserialize, Serialize};

/// Configuration settings for Sandman self-update behavior.
///
/// `UpgradeConfig` controls where new builds are fetched from and how downloads
/// are checked. It lives under the `[upgrade]` table of the global configuration.
///
/// # Default Behavior
///
/// - Builds come from `dreamfactorysoftware.github.io`
/// - HTTPS is used whenever TLS is available
/// - Requests give up after 60 seconds
/// - Published checksums are verified
///
/// # TOML Example
/// ```toml
/// [upgrade]
/// distribution_host = "dreamfactorysoftware.github.io"
/// secure = true
/// http_timeout_secs = 60
/// verify_checksum = true
/// artifact_name = "sandman"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Host serving `/version` and the downloadable builds.
    #[serde(default = "default_distribution_host")]
    pub distribution_host: String,

    /// Use `https` for the distribution host.
    ///
    /// Only set this to `false` on hosts where TLS is genuinely unavailable.
    #[serde(default = "default_secure")]
    pub secure: bool,

    /// Upper bound for each HTTP request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Verify the downloaded build against `<artifact>.sha256` when the server
    /// publishes one.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,

    /// File name of the build on the distribution host.
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            distribution_host: default_distribution_host(),
            secure: default_secure(),
            http_timeout_secs: default_http_timeout_secs(),
            verify_checksum: default_verify_checksum(),
            artifact_name: default_artifact_name(),
        }
    }
}

fn default_distribution_host() -> String {
    "dreamfactorysoftware.github.io".to_string()
}

const fn default_secure() -> bool {
    true
}

const fn default_http_timeout_secs() -> u64 {
    60
}

const fn default_verify_checksum() -> bool {
    true
}

fn default_artifact_name() -> String {
    format!("sandman{}", std::env::consts::EXE_SUFFIX)
}

impl UpgradeConfig {
    /// Create a new `UpgradeConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
