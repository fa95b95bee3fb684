//! Network access to the distribution server.
//!
//! The distribution server is a static site with this layout:
//!
//! ```text
//! /version                          latest version identifier (plain text)
//! /<artifact>                       build of the latest version
//! /download/<version>/<artifact>    build of a tagged version
//! <artifact url>.sha256             optional checksum of a build
//! ```

use crate::core::SandmanError;
use crate::upgrade::config::UpgradeConfig;
use crate::upgrade::version::is_content_id;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Network fetch service used by the orchestrator.
///
/// A resource the server does not have must fail with
/// [`SandmanError::NotFound`], so callers can tell it apart from a server that
/// could not be reached.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch `url` and return the body as text.
    async fn get(&self, url: &str) -> Result<String>;

    /// Fetch `url` and write the body to `destination`.
    async fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Locations on the distribution server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionEndpoint {
    base_url: String,
    artifact_name: String,
}

impl DistributionEndpoint {
    /// Build the endpoint for `host`.
    ///
    /// The scheme is `https` when `secure` is set, else `http`. A host that
    /// already carries a scheme is used as given.
    pub fn new(host: &str, secure: bool, artifact_name: impl Into<String>) -> Self {
        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            let scheme = if secure { "https" } else { "http" };
            format!("{scheme}://{host}")
        };

        Self {
            base_url,
            artifact_name: artifact_name.into(),
        }
    }

    /// Endpoint described by the `[upgrade]` configuration.
    #[must_use]
    pub fn from_config(config: &UpgradeConfig) -> Self {
        Self::new(&config.distribution_host, config.secure, config.artifact_name.clone())
    }

    /// URL of the latest-version descriptor.
    #[must_use]
    pub fn version_url(&self) -> String {
        format!("{}/version", self.base_url)
    }

    /// URL of the build for `version`.
    ///
    /// Content identifiers are only served as the latest build, at the root.
    #[must_use]
    pub fn artifact_url(&self, version: &str) -> String {
        if is_content_id(version) {
            format!("{}/{}", self.base_url, self.artifact_name)
        } else {
            format!("{}/download/{}/{}", self.base_url, version, self.artifact_name)
        }
    }

    /// URL of the published checksum for `version`.
    #[must_use]
    pub fn checksum_url(&self, version: &str) -> String {
        format!("{}.sha256", self.artifact_url(version))
    }

    /// File name of the build.
    #[must_use]
    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }
}

/// [`Fetcher`] backed by `reqwest`, with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sandman/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
        })
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| SandmanError::Network {
            operation: format!("fetching {url}"),
            reason: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SandmanError::NotFound {
                url: url.to_string(),
            }
            .into());
        }

        if !response.status().is_success() {
            return Err(SandmanError::Network {
                operation: format!("fetching {url}"),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        let response = self.fetch(url).await?;
        response.text().await.with_context(|| format!("Failed to read response from {url}"))
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let response = self.fetch(url).await?;
        let bytes =
            response.bytes().await.with_context(|| format!("Failed to download {url}"))?;

        tokio::fs::write(destination, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", destination.display()))?;

        debug!("Downloaded {} bytes to {:?}", bytes.len(), destination);
        Ok(())
    }
}
