//! Host package model.
//!
//! Packages come from the host package manager's metadata. Each one may carry
//! an extension block at `extra.nodevendor.node` declaring the Node.js version
//! it needs; the root package's block also carries the settings.

pub mod graph;

use serde::Deserialize;
use serde_json::Value;

use crate::config::RuntimeMetadata;

pub use graph::PackageGraph;

/// Top-level key of the extension block inside a package's `extra`.
pub const METADATA_NAMESPACE: &str = "nodevendor";
/// Key of the runtime block inside the namespace.
pub const METADATA_TOOL: &str = "node";

/// A package in the host's dependency graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Package {
    /// Another name/version for an underlying package.
    Alias(AliasPackage),
    /// A package with its own metadata.
    Complete(CompletePackage),
}

impl Package {
    /// Resolve aliases down to the package that owns the metadata.
    pub fn unwrap_alias(&self) -> &CompletePackage {
        match self {
            Package::Alias(alias) => alias.target.unwrap_alias(),
            Package::Complete(package) => package,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Package::Alias(alias) => &alias.name,
            Package::Complete(package) => &package.name,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Package::Alias(_))
    }
}

impl From<CompletePackage> for Package {
    fn from(package: CompletePackage) -> Self {
        Package::Complete(package)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasPackage {
    pub name: String,
    pub version: String,
    pub target: Box<Package>,
}

impl AliasPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>, target: Package) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            target: Box::new(target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletePackage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub extra: Value,
}

impl CompletePackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            extra: Value::Null,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Raw extension block, if the package has one.
    pub fn metadata_block(&self) -> Option<&Value> {
        self.extra.get(METADATA_NAMESPACE)?.get(METADATA_TOOL)
    }

    /// Version constraint declared by this package.
    ///
    /// Lenient: a malformed block simply declares nothing.
    pub fn declared_constraint(&self) -> Option<&str> {
        let version = self.metadata_block()?.get("version")?.as_str()?.trim();
        if version.is_empty() {
            None
        } else {
            Some(version)
        }
    }

    /// Strictly parsed extension block, used for settings.
    pub fn runtime_metadata(&self) -> anyhow::Result<Option<RuntimeMetadata>> {
        match self.metadata_block() {
            None | Some(Value::Null) => Ok(None),
            Some(block) => {
                let metadata = RuntimeMetadata::deserialize(block).map_err(|e| {
                    anyhow::anyhow!(
                        "Invalid extra.{}.{} block in package '{}': {}",
                        METADATA_NAMESPACE,
                        METADATA_TOOL,
                        self.name,
                        e
                    )
                })?;
                Ok(Some(metadata))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declaring(name: &str, version: &str) -> CompletePackage {
        CompletePackage::new(name).with_extra(json!({
            "nodevendor": { "node": { "version": version } }
        }))
    }

    #[test]
    fn test_unwrap_alias_resolves_nested_aliases() {
        let base = Package::from(declaring("acme/widgets", "^18"));
        let inner = Package::Alias(AliasPackage::new("acme/widgets", "1.0.x-dev", base));
        let outer = Package::Alias(AliasPackage::new("acme/widgets", "1.x-dev", inner));

        let resolved = outer.unwrap_alias();

        assert_eq!(resolved.name, "acme/widgets");
        assert_eq!(resolved.declared_constraint(), Some("^18"));
    }

    #[test]
    fn test_declared_constraint_ignores_non_string_and_blank() {
        let numeric = CompletePackage::new("a/b").with_extra(json!({
            "nodevendor": { "node": { "version": 18 } }
        }));
        let blank = declaring("a/c", "   ");

        assert_eq!(numeric.declared_constraint(), None);
        assert_eq!(blank.declared_constraint(), None);
        assert_eq!(CompletePackage::new("a/d").declared_constraint(), None);
    }

    #[test]
    fn test_runtime_metadata_rejects_unknown_keys() {
        let package = CompletePackage::new("root").with_extra(json!({
            "nodevendor": { "node": { "version": "^20", "targetdir": "x" } }
        }));

        let err = package.runtime_metadata().unwrap_err().to_string();

        assert!(err.contains("targetdir"), "unexpected error: {}", err);
    }

    #[test]
    fn test_runtime_metadata_absent_block() {
        let package = CompletePackage::new("root").with_extra(json!({ "other": {} }));
        assert!(package.runtime_metadata().unwrap().is_none());
    }
}
