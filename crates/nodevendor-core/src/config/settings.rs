//! Per-project settings read from the root package's extension block.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::InstallError;
use crate::package::CompletePackage;

/// Default location of the project-local runtime cache.
pub const DEFAULT_TARGET_DIR: &str = "vendor/nodejs/nodejs";

/// The `extra.nodevendor.node` block as written by package authors.
///
/// Every package may set `version`; only the root package's other keys are
/// honoured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeMetadata {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub target_dir: Option<String>,
    #[serde(default)]
    pub force_local: Option<bool>,
    #[serde(default)]
    pub include_bin_in_path: Option<bool>,
}

/// Resolved settings for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    target_dir: PathBuf,
    force_local: bool,
    include_bin_in_path: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            force_local: false,
            include_bin_in_path: false,
        }
    }
}

impl Settings {
    /// Apply one override layer on top of `defaults`.
    pub fn merge(defaults: Settings, overrides: &RuntimeMetadata) -> Result<Settings, InstallError> {
        let target_dir = match overrides.target_dir.as_deref() {
            Some(raw) => normalize_target_dir(raw)?,
            None => defaults.target_dir,
        };

        Ok(Settings {
            target_dir,
            force_local: overrides.force_local.unwrap_or(defaults.force_local),
            include_bin_in_path: overrides
                .include_bin_in_path
                .unwrap_or(defaults.include_bin_in_path),
        })
    }

    /// Settings declared by the root package, over the defaults.
    pub fn from_root(root: &CompletePackage) -> Result<Settings, InstallError> {
        let metadata = root
            .runtime_metadata()
            .map_err(|e| InstallError::InvalidSettings(format!("{:#}", e)))?
            .unwrap_or_default();
        Self::merge(Settings::default(), &metadata)
    }

    /// Settings for removing an install.
    ///
    /// Invalid settings must not strand an install on disk, so a block that
    /// fails strict parsing falls back to its `targetDir` when that string is
    /// still usable, and to the defaults otherwise.
    pub fn for_uninstall(root: &CompletePackage) -> Settings {
        match Self::from_root(root) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}; removing with default settings", e);
                let target_dir = root
                    .metadata_block()
                    .and_then(|block| block.get("targetDir"))
                    .and_then(|value| value.as_str())
                    .and_then(|raw| normalize_target_dir(raw).ok());
                match target_dir {
                    Some(target_dir) => Settings {
                        target_dir,
                        ..Settings::default()
                    },
                    None => Settings::default(),
                }
            }
        }
    }

    pub fn with_force_local(mut self, force_local: bool) -> Self {
        self.force_local = force_local;
        self
    }

    /// Target directory as configured, usually relative to the project root.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn force_local(&self) -> bool {
        self.force_local
    }

    pub fn include_bin_in_path(&self) -> bool {
        self.include_bin_in_path
    }

    /// Target directory anchored at `project_root` unless already absolute.
    pub fn resolve_target_dir(&self, project_root: &Path) -> PathBuf {
        if self.target_dir.is_absolute() {
            self.target_dir.clone()
        } else {
            project_root.join(&self.target_dir)
        }
    }
}

/// Accept either separator and reject paths that escape upwards.
fn normalize_target_dir(raw: &str) -> Result<PathBuf, InstallError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InstallError::InvalidSettings(
            "targetDir must not be empty".to_string(),
        ));
    }

    // Windows drive paths keep their native form.
    if Path::new(trimmed).is_absolute() && !trimmed.starts_with(['/', '\\']) {
        return Ok(PathBuf::from(trimmed));
    }

    let unified = trimmed.replace('\\', "/");
    let mut path = if unified.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };
    let mut segments = 0;
    for segment in unified.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            return Err(InstallError::InvalidSettings(format!(
                "targetDir must not contain '..': {}",
                raw
            )));
        }
        path.push(segment);
        segments += 1;
    }

    if segments == 0 {
        return Err(InstallError::InvalidSettings(format!(
            "targetDir does not name a directory: {}",
            raw
        )));
    }

    Ok(path)
}
