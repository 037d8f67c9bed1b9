//! Error taxonomy surfaced to the host.
//!
//! Collaborators report failures with `anyhow`; the orchestrator maps them
//! onto these variants so the host can tell an unsatisfiable constraint from
//! a network or filesystem failure. Missing installs are not errors.

use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum InstallError {
    /// No version in the catalog matches the merged constraint.
    #[error("No available Node.js version satisfies constraint \"{constraint}\"")]
    ConstraintUnsatisfiable { constraint: String },

    /// The list of installable versions could not be fetched.
    #[error("Failed to fetch the list of available Node.js versions")]
    CatalogUnavailable(#[source] BoxError),

    #[error("Failed to install Node.js {version} into {}", target_dir.display())]
    Install {
        version: String,
        target_dir: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Failed to write bin scripts in {}", bin_dir.display())]
    Shims {
        bin_dir: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Failed to register {} on PATH", bin_dir.display())]
    PathRegistration {
        bin_dir: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Filesystem error at {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl InstallError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source: source.into(),
        }
    }
}
