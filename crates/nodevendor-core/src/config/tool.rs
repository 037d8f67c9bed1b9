//! User-level tool configuration (`~/.config/nodevendor/config.toml`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_DIST_URL: &str = "https://nodejs.org/dist/";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings that belong to the machine rather than the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Root of the Node.js distribution mirror, with a trailing slash.
    pub dist_url: Url,
    /// HTTP timeout for catalog fetches and downloads.
    pub download_timeout_secs: u64,
    /// Where downloaded archives are kept between installs.
    pub archive_cache_dir: PathBuf,
    /// Keep archives after a successful install.
    pub keep_archives: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolConfigFile {
    dist_url: Option<String>,
    download_timeout_secs: Option<u64>,
    archive_cache_dir: Option<PathBuf>,
    keep_archives: Option<bool>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            dist_url: Url::parse(DEFAULT_DIST_URL).expect("default dist URL is valid"),
            download_timeout_secs: DEFAULT_TIMEOUT_SECS,
            archive_cache_dir: default_archive_cache_dir(),
            keep_archives: true,
        }
    }
}

impl ToolConfig {
    /// Default location of the config file, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nodevendor").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: ToolConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(url) = file.dist_url {
            config = config.with_dist_url(&url)?;
        }
        if let Some(secs) = file.download_timeout_secs {
            config.download_timeout_secs = secs;
        }
        if let Some(dir) = file.archive_cache_dir {
            config.archive_cache_dir = dir;
        }
        if let Some(keep) = file.keep_archives {
            config.keep_archives = keep;
        }
        Ok(config)
    }

    /// Replace the distribution mirror. A trailing slash is added so that
    /// relative joins stay inside the mirror root.
    pub fn with_dist_url(mut self, raw: &str) -> anyhow::Result<Self> {
        let mut raw = raw.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        self.dist_url = Url::parse(&raw).with_context(|| format!("Invalid dist_url: {}", raw))?;
        Ok(self)
    }

    pub fn with_archive_cache_dir(mut self, dir: PathBuf) -> Self {
        self.archive_cache_dir = dir;
        self
    }
}

fn default_archive_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("nodevendor")
        .join("archives")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = ToolConfig::load(Path::new("/definitely/not/here/config.toml")).unwrap();
        assert_eq!(config.dist_url.as_str(), DEFAULT_DIST_URL);
        assert_eq!(config.download_timeout_secs, 300);
        assert!(config.keep_archives);
    }

    #[test]
    fn test_parse_overrides() {
        let config = ToolConfig::from_toml_str(
            r#"
            dist_url = "https://mirror.example.com/node"
            download_timeout_secs = 30
            keep_archives = false
            "#,
        )
        .unwrap();

        assert_eq!(config.dist_url.as_str(), "https://mirror.example.com/node/");
        assert_eq!(config.download_timeout_secs, 30);
        assert!(!config.keep_archives);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_urls() {
        assert!(ToolConfig::from_toml_str("mirror = \"x\"").is_err());
        assert!(ToolConfig::from_toml_str("dist_url = \"not a url\"").is_err());
    }
}
