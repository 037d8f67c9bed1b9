//! Removal of the local runtime and its shims.
//!
//! Runs after the host has already dropped this package, so it relies on
//! filesystem primitives only.

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::fs::{remove_dir_if_empty, remove_path_if_exists};
use crate::installer::SHIM_NAMES;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed_target: bool,
    /// Parent of the target dir, when it was left empty and removed too.
    pub removed_parent: Option<PathBuf>,
    pub removed_shims: Vec<PathBuf>,
}

/// Remove `target_dir` (and its parent if that leaves it empty), then every
/// known shim name in `bin_dir`. Missing paths are not errors.
pub fn uninstall(bin_dir: &Path, target_dir: &Path) -> Result<UninstallReport, InstallError> {
    let mut report = UninstallReport::default();

    if target_dir.exists() {
        report.removed_target = remove_path_if_exists(target_dir)
            .map_err(|e| InstallError::filesystem(target_dir, e))?;

        if let Some(parent) = target_dir.parent()
            && !parent.as_os_str().is_empty()
            && remove_dir_if_empty(parent).map_err(|e| InstallError::filesystem(parent, e))?
        {
            report.removed_parent = Some(parent.to_path_buf());
        }
    }

    for name in SHIM_NAMES {
        let shim = bin_dir.join(name);
        if remove_path_if_exists(&shim).map_err(|e| InstallError::filesystem(&shim, e))? {
            report.removed_shims.push(shim);
        }
    }

    tracing::debug!(
        "Uninstalled {} (target removed: {}, shims removed: {})",
        target_dir.display(),
        report.removed_target,
        report.removed_shims.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_uninstall_keeps_non_empty_parent() {
        let temp = TempDir::new().unwrap();
        let parent = temp.path().join("vendor");
        let target = parent.join("nodejs");
        std::fs::create_dir_all(target.join("bin")).unwrap();
        std::fs::write(parent.join("other.txt"), "keep").unwrap();

        let report = uninstall(&temp.path().join("bin"), &target).unwrap();

        assert!(report.removed_target);
        assert!(report.removed_parent.is_none());
        assert!(!target.exists());
        assert!(parent.join("other.txt").exists());
    }

    #[test]
    fn test_uninstall_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("vendor/nodejs");

        let first = uninstall(&temp.path().join("bin"), &target).unwrap();
        let second = uninstall(&temp.path().join("bin"), &target).unwrap();

        assert_eq!(first, UninstallReport::default());
        assert_eq!(second, UninstallReport::default());
    }
}
