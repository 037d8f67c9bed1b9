//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use crate::catalog::DistCatalog;
use crate::config::ToolConfig;
use crate::installer::NodeInstaller;
use crate::orchestration::Collaborators;
use crate::platform::Platform;
use crate::probe::SystemProbe;
use crate::version::SemverMatcher;

/// Default bin directory, relative to the project root.
pub const DEFAULT_BIN_DIR: &str = "vendor/bin";

/// Progress reporting handed to collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoContext {
    verbose: bool,
}

impl IoContext {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Report a step. Only verbose runs print at the default filter.
    pub fn narrate(&self, message: impl AsRef<str>) {
        if self.verbose {
            tracing::info!("{}", message.as_ref());
        } else {
            tracing::debug!("{}", message.as_ref());
        }
    }
}

/// Unified application context for dependency injection.
///
/// Frontends create this once per run and use it to build the collaborators
/// handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct AppContext {
    project_root: PathBuf,
    bin_dir: PathBuf,
    tool_config: ToolConfig,
    io: IoContext,
    /// Layout of the running machine; shims always follow it.
    platform: Platform,
    /// Published Node.js distribution for this machine, if any.
    distribution: Option<Platform>,
}

impl AppContext {
    /// Create a context for the running machine.
    ///
    /// Machines without a published distribution still get a context; only
    /// listing and downloading runtimes fail there.
    pub fn new(project_root: PathBuf, tool_config: ToolConfig, io: IoContext) -> Self {
        Self::with_platform(project_root, tool_config, io, Platform::host())
            .with_distribution(Platform::current())
    }

    /// Create context for an explicit platform (for testing).
    pub fn with_platform(
        project_root: PathBuf,
        tool_config: ToolConfig,
        io: IoContext,
        platform: Platform,
    ) -> Self {
        let bin_dir = project_root.join(DEFAULT_BIN_DIR);
        Self {
            project_root,
            bin_dir,
            tool_config,
            io,
            platform,
            distribution: platform.is_distributed().then_some(platform),
        }
    }

    pub fn with_distribution(mut self, distribution: Option<Platform>) -> Self {
        self.distribution = distribution;
        self
    }

    /// Override the bin directory; relative paths are anchored at the
    /// project root.
    pub fn with_bin_dir(mut self, bin_dir: PathBuf) -> Self {
        self.bin_dir = self.resolve(&bin_dir);
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn tool_config(&self) -> &ToolConfig {
        &self.tool_config
    }

    pub fn io(&self) -> IoContext {
        self.io
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn distribution(&self) -> Option<Platform> {
        self.distribution
    }

    /// `path` anchored at the project root unless already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn matcher(&self) -> SemverMatcher {
        SemverMatcher
    }

    pub fn catalog(&self) -> DistCatalog {
        DistCatalog::new(&self.tool_config, self.distribution)
    }

    /// Probe that never mistakes our own shims for a global install.
    pub fn probe(&self) -> SystemProbe {
        SystemProbe::new(self.platform).excluding_bin_dir(self.bin_dir.clone())
    }

    pub fn installer(&self) -> NodeInstaller {
        NodeInstaller::new(self.platform, self.tool_config.clone(), self.io)
            .with_distribution(self.distribution)
    }

    /// The concrete collaborators for an orchestration run.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            matcher: Box::new(self.matcher()),
            catalog: Box::new(self.catalog()),
            probe: Box::new(self.probe()),
            installer: Box::new(self.installer()),
        }
    }
}
