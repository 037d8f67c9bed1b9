//! `PATH` registration for the bin directory.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// `current` with `bin_dir` in front, unless it is already listed.
pub fn prepend_path(bin_dir: &Path, current: Option<&OsStr>) -> anyhow::Result<OsString> {
    let mut entries: Vec<PathBuf> = current
        .map(|value| std::env::split_paths(value).collect())
        .unwrap_or_default();

    if entries.iter().any(|entry| same_dir(entry, bin_dir)) {
        return Ok(current.map(OsStr::to_os_string).unwrap_or_default());
    }

    entries.insert(0, bin_dir.to_path_buf());
    std::env::join_paths(entries)
        .with_context(|| format!("Cannot add {} to PATH", bin_dir.display()))
}

/// `PATH` of the current process with `bin_dir` registered.
pub fn registered_path(bin_dir: &Path) -> anyhow::Result<OsString> {
    prepend_path(bin_dir, std::env::var_os("PATH").as_deref())
}

/// Shell line exporting `path`, for `eval` by the caller.
pub fn export_line(path: &OsStr) -> String {
    let value = path.to_string_lossy().replace('\'', "'\\''");
    format!("export PATH='{}'", value)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
