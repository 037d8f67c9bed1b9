//! Detection of existing Node.js installs.
//!
//! Absence is an expected outcome and is reported as `None`, never as an
//! error: it only routes the orchestrator's decision tree.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::installer::receipt::InstallReceipt;
use crate::platform::Platform;
use crate::version::parse_version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeLocation {
    /// Project-cached install in the target directory.
    Local,
    /// Install found on the user's `PATH`.
    Global,
}

/// A detected runtime. Built fresh on every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRuntime {
    pub version: String,
    pub location: RuntimeLocation,
    pub node_path: PathBuf,
    /// npm executable (global) or npm CLI script (local).
    pub companion_path: Option<PathBuf>,
}

impl InstalledRuntime {
    pub fn has_companion_tool(&self) -> bool {
        self.companion_path.is_some()
    }
}

pub trait RuntimeProbe {
    /// Node.js on `PATH`, with its npm companion if present.
    fn global(&self) -> Option<InstalledRuntime>;

    /// Node.js previously installed into `target_dir`.
    fn local(&self, target_dir: &Path) -> Option<InstalledRuntime>;
}

/// Probe against the real system.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    platform: Platform,
    /// Directory holding our own shims; never treated as a global install.
    bin_dir: Option<PathBuf>,
    /// Searched instead of the `PATH` environment variable when set.
    search_path: Option<OsString>,
}

impl SystemProbe {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            bin_dir: None,
            search_path: None,
        }
    }

    pub fn with_search_path(mut self, search_path: OsString) -> Self {
        self.search_path = Some(search_path);
        self
    }

    pub fn excluding_bin_dir(mut self, bin_dir: PathBuf) -> Self {
        self.bin_dir = Some(bin_dir);
        self
    }

    /// `PATH` without the shim directory.
    fn search_path(&self) -> Option<OsString> {
        let path = match &self.search_path {
            Some(path) => path.clone(),
            None => std::env::var_os("PATH")?,
        };
        let excluded = self.bin_dir.as_deref().map(canonical);
        let kept: Vec<PathBuf> = std::env::split_paths(&path)
            .filter(|entry| excluded.as_ref() != Some(&canonical(entry)))
            .collect();
        std::env::join_paths(kept).ok()
    }

    fn find(&self, name: &str, search: &OsString) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(name, Some(search), cwd).ok()
    }
}

impl RuntimeProbe for SystemProbe {
    fn global(&self) -> Option<InstalledRuntime> {
        let search = self.search_path()?;
        let Some(node) = self.find("node", &search) else {
            debug!("No node executable on PATH");
            return None;
        };
        let version = run_version(&node)?;
        let npm = self.find("npm", &search);
        debug!(
            "Found global Node.js {} at {} (npm: {})",
            version,
            node.display(),
            npm.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "missing".to_string())
        );
        Some(InstalledRuntime {
            version,
            location: RuntimeLocation::Global,
            node_path: node,
            companion_path: npm,
        })
    }

    fn local(&self, target_dir: &Path) -> Option<InstalledRuntime> {
        let node = self.platform.node_binary(target_dir);
        if !node.exists() {
            debug!("No local Node.js in {}", target_dir.display());
            return None;
        }

        let version = match InstallReceipt::load(target_dir) {
            Ok(Some(receipt)) if receipt.platform != self.platform => {
                debug!(
                    "Ignoring {} install in {}; this machine is {}",
                    receipt.platform,
                    target_dir.display(),
                    self.platform
                );
                return None;
            }
            Ok(Some(receipt)) => receipt.version,
            Ok(None) => run_version(&node)?,
            Err(e) => {
                debug!("Ignoring unreadable install receipt: {:#}", e);
                run_version(&node)?
            }
        };

        let npm = self.platform.npm_cli_script(target_dir);
        Some(InstalledRuntime {
            version,
            location: RuntimeLocation::Local,
            node_path: node,
            companion_path: npm.exists().then_some(npm),
        })
    }
}

/// Run `<binary> --version` and parse the reported version.
fn run_version(binary: &Path) -> Option<String> {
    let output = match Command::new(binary).arg("--version").output() {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run {}: {}", binary.display(), e);
            return None;
        }
    };
    if !output.status.success() {
        debug!("{} --version exited with {}", binary.display(), output.status);
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version(stdout.trim()).map(|version| version.to_string())
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
