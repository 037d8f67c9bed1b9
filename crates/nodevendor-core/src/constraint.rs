//! Merging the version constraints declared across the package graph.

use std::borrow::Borrow;
use std::collections::HashSet;

use crate::package::{Package, PackageGraph};

/// Constraint used when no package declares one.
pub const WILDCARD: &str = "*";

/// Separator between individually declared constraints.
pub const SEPARATOR: &str = ", ";

/// Merge every declared constraint into one expression.
///
/// Aliases are resolved to their underlying package and each underlying
/// package contributes at most once, so an alias never adds a second copy of
/// a declaration. Declarations keep iteration order.
pub fn merge_constraints<I, P>(packages: I) -> String
where
    I: IntoIterator<Item = P>,
    P: Borrow<Package>,
{
    let mut seen = HashSet::new();
    let mut declared = Vec::new();

    for package in packages {
        let package = package.borrow().unwrap_alias();
        if !seen.insert(package.name.clone()) {
            continue;
        }
        if let Some(constraint) = package.declared_constraint() {
            declared.push(constraint.to_string());
        }
    }

    if declared.is_empty() {
        WILDCARD.to_string()
    } else {
        declared.join(SEPARATOR)
    }
}

/// Merge the constraints of a graph: installed packages first, root last.
pub fn merge_graph_constraints(graph: &PackageGraph) -> String {
    merge_constraints(graph.iter_with_root())
}
