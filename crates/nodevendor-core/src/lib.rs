//! nodevendor Core Library
//!
//! Provides a project-local Node.js runtime for a host package manager:
//! merges the version constraints packages declare, reuses a satisfying
//! global or cached install, otherwise downloads one, and keeps the
//! bin-directory shims pointing at the selected runtime.

pub mod catalog;
pub mod config;
pub mod constraint;
pub mod context;
pub mod error;
pub mod fs;
mod http;
pub mod installer;
pub mod orchestration;
pub mod package;
pub mod platform;
pub mod probe;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{RuntimeMetadata, Settings, ToolConfig};
    pub use crate::context::{AppContext, IoContext};
    pub use crate::error::InstallError;

    // Packages
    pub use crate::constraint::{merge_constraints, merge_graph_constraints};
    pub use crate::package::{AliasPackage, CompletePackage, Package, PackageGraph};

    // Collaborators
    pub use crate::catalog::{DistCatalog, VersionCatalog};
    pub use crate::installer::{Installer, NodeInstaller, ShimTarget};
    pub use crate::platform::Platform;
    pub use crate::probe::{InstalledRuntime, RuntimeLocation, RuntimeProbe, SystemProbe};
    pub use crate::version::{SemverMatcher, VersionMatcher};

    // Orchestration
    pub use crate::orchestration::{
        Collaborators, LocalInstall, Mode, Orchestrator, RunOutcome, RunReport, RunRequest,
        UninstallReport,
    };
}
