//! Catalog of installable Node.js versions.

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::config::ToolConfig;
use crate::http;
use crate::platform::{Platform, no_distribution_error};

/// Lists the versions that can be installed.
pub trait VersionCatalog {
    /// Versions without `v` prefix, newest first. Failures are not retried.
    fn list_versions(&self) -> anyhow::Result<Vec<String>>;
}

/// One entry of the distribution's `index.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DistRelease {
    pub version: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Catalog backed by a Node.js distribution mirror (`<dist_url>/index.json`).
#[derive(Debug, Clone)]
pub struct DistCatalog {
    dist_url: Url,
    /// `None` on hosts without a published distribution.
    platform: Option<Platform>,
    timeout_secs: u64,
}

impl DistCatalog {
    pub fn new(config: &ToolConfig, platform: impl Into<Option<Platform>>) -> Self {
        Self {
            dist_url: config.dist_url.clone(),
            platform: platform.into(),
            timeout_secs: config.download_timeout_secs,
        }
    }

    pub fn index_url(&self) -> anyhow::Result<Url> {
        self.dist_url
            .join("index.json")
            .with_context(|| format!("Invalid dist URL: {}", self.dist_url))
    }

    async fn fetch_index(&self) -> anyhow::Result<Vec<DistRelease>> {
        let url = self.index_url()?;
        let client = http::client(self.timeout_secs)?;
        tracing::debug!("Fetching version index from {}", url);
        let body = http::fetch_bytes(&client, url.as_str()).await?;
        parse_index(&body).with_context(|| format!("Failed to parse version index from {}", url))
    }
}

impl VersionCatalog for DistCatalog {
    fn list_versions(&self) -> anyhow::Result<Vec<String>> {
        let platform = self.platform.ok_or_else(no_distribution_error)?;
        let releases = http::block_on(self.fetch_index())??;
        Ok(versions_for_platform(&releases, platform))
    }
}

pub fn parse_index(body: &[u8]) -> anyhow::Result<Vec<DistRelease>> {
    Ok(serde_json::from_slice(body)?)
}

/// Versions that publish an archive for `platform`, in index order.
pub fn versions_for_platform(releases: &[DistRelease], platform: Platform) -> Vec<String> {
    let key = platform.index_file_key();
    releases
        .iter()
        .filter(|release| release.files.iter().any(|file| file == &key))
        .map(|release| {
            release
                .version
                .strip_prefix('v')
                .unwrap_or(&release.version)
                .to_string()
        })
        .collect()
}
