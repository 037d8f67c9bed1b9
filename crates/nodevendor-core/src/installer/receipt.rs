//! Install receipt written next to a local install.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

pub const RECEIPT_FILE: &str = ".nodevendor-receipt.json";

/// What was installed into a target directory, and from where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub version: String,
    pub platform: Platform,
    pub source_url: String,
    pub installed_at: chrono::DateTime<chrono::Utc>,
}

impl InstallReceipt {
    pub fn new(version: impl Into<String>, platform: Platform, source_url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            platform,
            source_url: source_url.into(),
            installed_at: chrono::Utc::now(),
        }
    }

    pub fn path(install_dir: &Path) -> PathBuf {
        install_dir.join(RECEIPT_FILE)
    }

    /// Load the receipt of `install_dir`, `None` if there is none.
    pub fn load(install_dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = Self::path(install_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read install receipt: {}", path.display()))?;
        let receipt = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse install receipt: {}", path.display()))?;
        Ok(Some(receipt))
    }

    pub fn save(&self, install_dir: &Path) -> anyhow::Result<()> {
        let path = Self::path(install_dir);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize install receipt")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write install receipt: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};
    use tempfile::TempDir;

    #[test]
    fn test_receipt_save_and_load() {
        let temp = TempDir::new().unwrap();
        let receipt = InstallReceipt::new(
            "20.11.0",
            Platform::new(Os::Linux, Arch::X64),
            "https://nodejs.org/dist/v20.11.0/node-v20.11.0-linux-x64.tar.xz",
        );

        receipt.save(temp.path()).unwrap();
        let loaded = InstallReceipt::load(temp.path()).unwrap().unwrap();

        assert_eq!(loaded, receipt);
    }

    #[test]
    fn test_receipt_missing_and_corrupt() {
        let temp = TempDir::new().unwrap();
        assert!(InstallReceipt::load(temp.path()).unwrap().is_none());

        std::fs::write(InstallReceipt::path(temp.path()), "{not json").unwrap();
        assert!(InstallReceipt::load(temp.path()).is_err());
    }
}
