//! Filesystem primitives shared by install and uninstall.

use std::path::Path;

use anyhow::Context;

/// Remove a path (file or directory) if it exists.
///
/// Returns `Ok(true)` if something was removed, `Ok(false)` if path didn't exist.
pub fn remove_path_if_exists(path: &Path) -> anyhow::Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read metadata: {}", path.display()));
        }
    };
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(true)
}

/// Remove a directory only if it has no entries.
///
/// Returns `Ok(true)` if the directory was removed.
pub fn remove_dir_if_empty(path: &Path) -> anyhow::Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = std::fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;
    if entries.next().is_some() {
        return Ok(false);
    }
    std::fs::remove_dir(path)
        .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    Ok(true)
}

/// Write `content` unless the file already holds exactly those bytes.
///
/// Returns `Ok(true)` if the file was written.
pub fn write_if_changed(path: &Path, content: &[u8]) -> anyhow::Result<bool> {
    if let Ok(existing) = std::fs::read(path)
        && existing == content
    {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_path_if_exists_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        assert!(!remove_path_if_exists(&temp.path().join("missing")).unwrap());
    }

    #[test]
    fn test_remove_path_if_exists_file_and_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        let dir = temp.path().join("dir");
        std::fs::write(&file, "x").unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();

        assert!(remove_path_if_exists(&file).unwrap());
        assert!(remove_path_if_exists(&dir).unwrap());
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_dir_if_empty() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty");
        let full = temp.path().join("full");
        std::fs::create_dir(&empty).unwrap();
        std::fs::create_dir(&full).unwrap();
        std::fs::write(full.join("keep"), "x").unwrap();

        assert!(remove_dir_if_empty(&empty).unwrap());
        assert!(!remove_dir_if_empty(&full).unwrap());
        assert!(!empty.exists());
        assert!(full.exists());
    }

    #[test]
    fn test_write_if_changed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bin").join("node");

        assert!(write_if_changed(&path, b"a").unwrap());
        assert!(!write_if_changed(&path, b"a").unwrap());
        assert!(write_if_changed(&path, b"b").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"b");
    }
}
