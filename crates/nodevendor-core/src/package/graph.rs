//! Reading the host's package graph from disk.
//!
//! The root manifest is a `composer.json`-style document. The installed list
//! is either a bare array of packages or an object with a `packages` array,
//! optionally followed by an `aliases` array.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::{AliasPackage, CompletePackage, Package};

#[derive(Debug, Clone, PartialEq)]
pub struct PackageGraph {
    pub root: CompletePackage,
    pub packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstalledFile {
    List(Vec<CompletePackage>),
    Object {
        #[serde(default)]
        packages: Vec<CompletePackage>,
        #[serde(default)]
        aliases: Vec<AliasEntry>,
    },
}

#[derive(Debug, Deserialize)]
struct AliasEntry {
    package: String,
    alias: String,
}

impl PackageGraph {
    pub fn new(root: CompletePackage, packages: Vec<Package>) -> Self {
        Self { root, packages }
    }

    /// Load the root manifest and, when present, the installed package list.
    pub fn load(root_manifest: &Path, installed: Option<&Path>) -> anyhow::Result<Self> {
        let root = read_root_manifest(root_manifest)?;
        let packages = match installed {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse_installed(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            Some(path) => {
                tracing::debug!("No installed package list at {}", path.display());
                Vec::new()
            }
            None => Vec::new(),
        };
        Ok(Self { root, packages })
    }

    /// Installed packages in file order, then the root package.
    pub fn iter_with_root(&self) -> impl Iterator<Item = Package> + '_ {
        self.packages
            .iter()
            .cloned()
            .chain(std::iter::once(Package::Complete(self.root.clone())))
    }
}

/// Read a root manifest. A missing file is an error; the host always has one.
pub fn read_root_manifest(path: &Path) -> anyhow::Result<CompletePackage> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read root manifest: {}", path.display()))?;
    let mut root: CompletePackage = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse root manifest: {}", path.display()))?;
    if root.name.is_empty() {
        root.name = "__root__".to_string();
    }
    Ok(root)
}

pub fn parse_installed(content: &str) -> anyhow::Result<Vec<Package>> {
    let file: InstalledFile = serde_json::from_str(content)?;
    let (complete, aliases) = match file {
        InstalledFile::List(packages) => (packages, Vec::new()),
        InstalledFile::Object { packages, aliases } => (packages, aliases),
    };

    let by_name: HashMap<&str, &CompletePackage> =
        complete.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut alias_packages = Vec::with_capacity(aliases.len());
    for entry in &aliases {
        let target = by_name.get(entry.package.as_str()).ok_or_else(|| {
            anyhow::anyhow!(
                "Alias '{}' refers to unknown package '{}'",
                entry.alias,
                entry.package
            )
        })?;
        alias_packages.push(Package::Alias(AliasPackage::new(
            entry.package.clone(),
            entry.alias.clone(),
            Package::Complete((*target).clone()),
        )));
    }

    Ok(complete
        .into_iter()
        .map(Package::Complete)
        .chain(alias_packages)
        .collect())
}
