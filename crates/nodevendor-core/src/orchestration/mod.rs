//! Install/uninstall orchestration for the project runtime.
//!
//! One run per host lifecycle event. An install run ends in exactly one of
//! [`RunOutcome::ReusedGlobal`], [`RunOutcome::ReusedLocal`] or
//! [`RunOutcome::InstalledLocal`]; shims are regenerated whichever it is.

pub mod uninstall;

pub use uninstall::{UninstallReport, uninstall};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::catalog::VersionCatalog;
use crate::config::Settings;
use crate::constraint::merge_graph_constraints;
use crate::context::IoContext;
use crate::error::InstallError;
use crate::installer::{Installer, ShimReport, ShimTarget};
use crate::package::PackageGraph;
use crate::probe::RuntimeProbe;
use crate::version::VersionMatcher;

/// Lifecycle event the host is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Install or update; the full decision tree runs.
    Install,
    /// The package is being removed; only filesystem cleanup runs.
    Uninstall,
}

/// Collaborators the decision tree delegates to.
pub struct Collaborators {
    pub matcher: Box<dyn VersionMatcher>,
    pub catalog: Box<dyn VersionCatalog>,
    pub probe: Box<dyn RuntimeProbe>,
    pub installer: Box<dyn Installer>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub graph: &'a PackageGraph,
    pub settings: &'a Settings,
    /// Anchor for a relative target directory.
    pub project_root: &'a Path,
    pub bin_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    ReusedGlobal { version: String },
    ReusedLocal { version: String },
    InstalledLocal { version: String },
    Uninstalled(UninstallReport),
}

impl RunOutcome {
    /// Version the shims point at; `None` after an uninstall.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::ReusedGlobal { version }
            | Self::ReusedLocal { version }
            | Self::InstalledLocal { version } => Some(version),
            Self::Uninstalled(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Merged constraint; `None` for uninstall runs.
    pub constraint: Option<String>,
    pub shims: Option<ShimReport>,
    /// `PATH` with the bin directory registered, when requested.
    pub path: Option<OsString>,
}

/// Result of the local-install path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalInstall {
    /// A cached install already satisfied the constraint.
    Reused(String),
    Installed(String),
}

impl LocalInstall {
    pub fn version(&self) -> &str {
        match self {
            Self::Reused(version) | Self::Installed(version) => version,
        }
    }
}

pub struct Orchestrator {
    collaborators: Collaborators,
    io: IoContext,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, io: IoContext) -> Self {
        Self { collaborators, io }
    }

    pub fn run(&self, mode: Mode, request: &RunRequest<'_>) -> Result<RunReport, InstallError> {
        let target_dir = request.settings.resolve_target_dir(request.project_root);

        if mode == Mode::Uninstall {
            self.io
                .narrate(format!("Removing Node.js from {}", target_dir.display()));
            let report = uninstall(request.bin_dir, &target_dir)?;
            return Ok(RunReport {
                outcome: RunOutcome::Uninstalled(report),
                constraint: None,
                shims: None,
                path: None,
            });
        }

        let constraint = merge_graph_constraints(request.graph);
        self.io
            .narrate(format!("Node.js version constraint: {}", constraint));

        let global = if request.settings.force_local() {
            self.io.narrate("Local install forced by settings");
            None
        } else {
            self.reusable_global(&constraint)
        };

        let (outcome, shim_target) = match global {
            Some((version, shim_target)) => (RunOutcome::ReusedGlobal { version }, shim_target),
            None => {
                let outcome = match self.ensure_local(&constraint, &target_dir)? {
                    LocalInstall::Reused(version) => RunOutcome::ReusedLocal { version },
                    LocalInstall::Installed(version) => RunOutcome::InstalledLocal { version },
                };
                (outcome, ShimTarget::Local { target_dir })
            }
        };

        let shims = self
            .collaborators
            .installer
            .write_bin_scripts(request.bin_dir, &shim_target)
            .map_err(|e| InstallError::Shims {
                bin_dir: request.bin_dir.to_path_buf(),
                source: e.into(),
            })?;
        tracing::debug!(
            "Shims in {}: {} written, {} unchanged, {} removed",
            request.bin_dir.display(),
            shims.written.len(),
            shims.unchanged.len(),
            shims.removed.len()
        );

        let path = if request.settings.include_bin_in_path() {
            let path = self
                .collaborators
                .installer
                .register_bin_path(request.bin_dir)
                .map_err(|e| InstallError::PathRegistration {
                    bin_dir: request.bin_dir.to_path_buf(),
                    source: e.into(),
                })?;
            Some(path)
        } else {
            None
        };

        Ok(RunReport {
            outcome,
            constraint: Some(constraint),
            shims: Some(shims),
            path,
        })
    }

    /// Global install usable as is: present, with npm, and satisfying.
    fn reusable_global(&self, constraint: &str) -> Option<(String, ShimTarget)> {
        let Some(global) = self.collaborators.probe.global() else {
            self.io.narrate("No global Node.js found");
            return None;
        };

        let Some(npm) = global.companion_path else {
            self.io.narrate(format!(
                "Global Node.js {} has no npm, installing locally",
                global.version
            ));
            return None;
        };

        if !self.collaborators.matcher.satisfies(&global.version, constraint) {
            self.io.narrate(format!(
                "Global Node.js {} does not satisfy {}, installing locally",
                global.version, constraint
            ));
            return None;
        }

        self.io
            .narrate(format!("Using global Node.js {}", global.version));
        let target = ShimTarget::Global {
            node: global.node_path,
            npm,
        };
        Some((global.version, target))
    }

    /// Reuse the install cached in `target_dir` if it satisfies
    /// `constraint`, otherwise install the best available version over it.
    pub fn ensure_local(
        &self,
        constraint: &str,
        target_dir: &Path,
    ) -> Result<LocalInstall, InstallError> {
        if let Some(local) = self.collaborators.probe.local(target_dir) {
            if self.collaborators.matcher.satisfies(&local.version, constraint) {
                self.io.narrate(format!(
                    "Using local Node.js {} from {}",
                    local.version,
                    target_dir.display()
                ));
                return Ok(LocalInstall::Reused(local.version));
            }
            self.io.narrate(format!(
                "Local Node.js {} does not satisfy {}, replacing it",
                local.version, constraint
            ));
        }

        self.install_best(constraint, target_dir)
            .map(LocalInstall::Installed)
    }

    /// Install the highest catalog version satisfying `constraint` into
    /// `target_dir`. `target_dir` is untouched unless a version matched.
    pub fn install_best(&self, constraint: &str, target_dir: &Path) -> Result<String, InstallError> {
        let available = self
            .collaborators
            .catalog
            .list_versions()
            .map_err(|e| InstallError::CatalogUnavailable(e.into()))?;

        let Some(version) = self.collaborators.matcher.best_match(&available, constraint) else {
            return Err(InstallError::ConstraintUnsatisfiable {
                constraint: constraint.to_string(),
            });
        };

        self.io.narrate(format!(
            "Installing Node.js {} (best match for {})",
            version, constraint
        ));
        self.collaborators
            .installer
            .install(&version, target_dir)
            .map_err(|e| InstallError::Install {
                version: version.clone(),
                target_dir: PathBuf::from(target_dir),
                source: e.into(),
            })?;
        Ok(version)
    }
}
