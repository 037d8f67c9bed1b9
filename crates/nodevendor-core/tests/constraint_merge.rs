//! Constraint merging over package graphs read from disk.

use nodevendor_core::config::Settings;
use nodevendor_core::constraint::{WILDCARD, merge_graph_constraints};
use nodevendor_core::package::PackageGraph;
use tempfile::TempDir;

fn write_project(root_manifest: &str, installed: Option<&str>) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp.path().join("composer.json"), root_manifest)
        .expect("Failed to write root manifest");
    if let Some(installed) = installed {
        let dir = temp.path().join("vendor/composer");
        std::fs::create_dir_all(&dir).expect("Failed to create vendor/composer");
        std::fs::write(dir.join("installed.json"), installed).expect("Failed to write installed");
    }
    temp
}

fn load(temp: &TempDir) -> PackageGraph {
    PackageGraph::load(
        &temp.path().join("composer.json"),
        Some(&temp.path().join("vendor/composer/installed.json")),
    )
    .expect("Failed to load graph")
}

#[test]
fn no_declarations_merge_to_wildcard() {
    let temp = write_project(
        r#"{"name": "acme/app"}"#,
        Some(r#"{"packages": [{"name": "acme/lib", "version": "1.0.0"}]}"#),
    );

    assert_eq!(merge_graph_constraints(&load(&temp)), WILDCARD);
}

#[test]
fn missing_installed_list_uses_root_only() {
    let temp = write_project(
        r#"{"name": "acme/app", "extra": {"nodevendor": {"node": {"version": "^20"}}}}"#,
        None,
    );

    let graph = load(&temp);

    assert!(graph.packages.is_empty());
    assert_eq!(merge_graph_constraints(&graph), "^20");
}

#[test]
fn declarations_join_in_iteration_order_with_root_last() {
    let temp = write_project(
        r#"{
            "name": "acme/app",
            "extra": {"nodevendor": {"node": {"version": "<21", "forceLocal": true}}}
        }"#,
        Some(
            r#"{
                "packages": [
                    {"name": "acme/assets", "extra": {"nodevendor": {"node": {"version": ">=18"}}}},
                    {"name": "acme/plain"},
                    {"name": "acme/lint", "extra": {"nodevendor": {"node": {"version": "^18 || ^20"}}}}
                ],
                "aliases": [{"package": "acme/assets", "alias": "acme/assets-legacy"}]
            }"#,
        ),
    );

    let graph = load(&temp);

    assert_eq!(
        merge_graph_constraints(&graph),
        ">=18, ^18 || ^20, <21"
    );
    assert!(Settings::from_root(&graph.root).unwrap().force_local());
}

#[test]
fn bare_list_installed_format_is_accepted() {
    let temp = write_project(
        r#"{"name": "acme/app"}"#,
        Some(r#"[{"name": "acme/assets", "extra": {"nodevendor": {"node": {"version": "~18.19"}}}}]"#),
    );

    assert_eq!(merge_graph_constraints(&load(&temp)), "~18.19");
}

#[test]
fn malformed_root_settings_are_rejected() {
    let temp = write_project(
        r#"{"name": "acme/app", "extra": {"nodevendor": {"node": {"targetDir": "../outside"}}}}"#,
        None,
    );

    let graph = load(&temp);

    assert!(Settings::from_root(&graph.root).is_err());
}
