//! Installing Node.js into a target directory and exposing it to dependents.

pub mod extract;
pub mod path;
pub mod receipt;
pub mod shim;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use url::Url;

use crate::config::ToolConfig;
use crate::context::IoContext;
use crate::fs::remove_path_if_exists;
use crate::http;
use crate::platform::{Platform, no_distribution_error};

pub use receipt::InstallReceipt;
pub use shim::{SHIM_NAMES, ShimReport, ShimTarget};

/// Downloads runtimes and writes the shims dependents invoke.
pub trait Installer {
    /// Platform whose layout installs and shims follow.
    fn platform(&self) -> Platform;

    /// Fetch and extract `version` into `target_dir`, replacing prior contents.
    fn install(&self, version: &str, target_dir: &Path) -> anyhow::Result<()>;

    /// (Re)write the shims in `bin_dir` so they point at `target`.
    fn write_bin_scripts(&self, bin_dir: &Path, target: &ShimTarget) -> anyhow::Result<ShimReport> {
        shim::write_bin_scripts(bin_dir, target, self.platform())
    }

    /// `PATH` value with `bin_dir` registered exactly once.
    fn register_bin_path(&self, bin_dir: &Path) -> anyhow::Result<OsString> {
        path::registered_path(bin_dir)
    }
}

/// Installer for official Node.js binary distributions.
#[derive(Debug, Clone)]
pub struct NodeInstaller {
    /// Layout the shims follow.
    platform: Platform,
    /// Distribution downloaded; `None` when Node.js publishes none.
    distribution: Option<Platform>,
    config: ToolConfig,
    io: IoContext,
}

impl NodeInstaller {
    pub fn new(platform: Platform, config: ToolConfig, io: IoContext) -> Self {
        Self {
            platform,
            distribution: platform.is_distributed().then_some(platform),
            config,
            io,
        }
    }

    pub fn with_distribution(mut self, distribution: Option<Platform>) -> Self {
        self.distribution = distribution;
        self
    }

    fn distribution(&self) -> anyhow::Result<Platform> {
        self.distribution.ok_or_else(no_distribution_error)
    }

    /// Download URL of `version` for this installer's platform.
    pub fn archive_url(&self, version: &str) -> anyhow::Result<Url> {
        let relative = format!("v{}/{}", version, self.distribution()?.archive_name(version));
        self.config
            .dist_url
            .join(&relative)
            .with_context(|| format!("Invalid download URL for Node.js {}", version))
    }

    /// Fetch the archive into the cache, reusing an earlier download.
    fn fetch_archive(&self, version: &str, url: &Url) -> anyhow::Result<PathBuf> {
        let cache_dir = &self.config.archive_cache_dir;
        let archive_path = cache_dir.join(self.distribution()?.archive_name(version));
        if archive_path.exists() {
            tracing::debug!("Archive already downloaded: {}", archive_path.display());
            return Ok(archive_path);
        }

        std::fs::create_dir_all(cache_dir).with_context(|| {
            format!("Failed to create archive cache: {}", cache_dir.display())
        })?;

        self.io
            .narrate(format!("Downloading Node.js {} from {}", version, url));
        let client = http::client(self.config.download_timeout_secs)?;
        let bytes = http::block_on(http::fetch_bytes(&client, url.as_str()))?
            .with_context(|| format!("Failed to download Node.js {}", version))?;

        let temp_path = archive_path.with_extension("part");
        std::fs::write(&temp_path, &bytes)
            .with_context(|| format!("Failed to write download: {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &archive_path)
            .with_context(|| format!("Failed to finalize download: {}", archive_path.display()))?;

        Ok(archive_path)
    }
}

impl Installer for NodeInstaller {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn install(&self, version: &str, target_dir: &Path) -> anyhow::Result<()> {
        let distribution = self.distribution()?;
        let url = self.archive_url(version)?;
        let archive_path = self.fetch_archive(version, &url)?;

        let staging = staging_dir(target_dir);
        remove_path_if_exists(&staging)?;

        self.io.narrate(format!(
            "Extracting Node.js {} into {}",
            version,
            target_dir.display()
        ));
        if let Err(e) = extract::extract_archive(&archive_path, &staging, distribution.archive_kind())
        {
            let _ = remove_path_if_exists(&staging);
            // A corrupt cached archive would fail every later run.
            let _ = remove_path_if_exists(&archive_path);
            return Err(e);
        }

        let node = distribution.node_binary(&staging);
        if !node.exists() {
            let _ = remove_path_if_exists(&staging);
            anyhow::bail!(
                "Archive {} does not contain {}",
                archive_path.display(),
                distribution.node_binary_relative().join("/")
            );
        }

        InstallReceipt::new(version, distribution, url.as_str()).save(&staging)?;

        remove_path_if_exists(target_dir)?;
        std::fs::rename(&staging, target_dir).with_context(|| {
            format!(
                "Failed to move {} to {}",
                staging.display(),
                target_dir.display()
            )
        })?;

        if !self.config.keep_archives {
            remove_path_if_exists(&archive_path)?;
        }

        self.io.narrate(format!(
            "Installed Node.js {} in {}",
            version,
            target_dir.display()
        ));
        Ok(())
    }
}

/// Sibling directory used while extracting, so `target_dir` is only
/// replaced once the new install is complete.
pub fn staging_dir(target_dir: &Path) -> PathBuf {
    let name = target_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "node".to_string());
    target_dir.with_file_name(format!(".{}.partial", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    #[test]
    fn test_archive_url() {
        let config = ToolConfig::default();
        let installer = NodeInstaller::new(
            Platform::new(Os::Linux, Arch::X64),
            config,
            IoContext::default(),
        );

        assert_eq!(
            installer.archive_url("20.11.0").unwrap().as_str(),
            "https://nodejs.org/dist/v20.11.0/node-v20.11.0-linux-x64.tar.xz"
        );
    }

    #[test]
    fn test_install_without_distribution_leaves_target_alone() {
        let temp = tempfile::TempDir::new().unwrap();
        let target_dir = temp.path().join("nodejs");
        std::fs::create_dir_all(&target_dir).unwrap();
        let installer = NodeInstaller::new(
            Platform::new(Os::Linux, Arch::X64),
            ToolConfig::default().with_archive_cache_dir(temp.path().join("cache")),
            IoContext::default(),
        )
        .with_distribution(None);

        let err = installer.install("20.11.0", &target_dir).unwrap_err();

        assert!(err.to_string().contains("does not publish binaries"));
        assert!(target_dir.exists());
        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn test_staging_dir_is_hidden_sibling() {
        assert_eq!(
            staging_dir(Path::new("/p/vendor/nodejs/nodejs")),
            PathBuf::from("/p/vendor/nodejs/.nodejs.partial")
        );
    }
}
