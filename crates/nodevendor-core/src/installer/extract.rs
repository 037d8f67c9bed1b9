//! Archive extraction for Node.js distributions.
//!
//! Distribution archives wrap everything in a single top-level directory
//! (`node-v20.11.0-linux-x64/`); it is stripped so the install lands
//! directly in the destination.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::platform::ArchiveKind;

pub fn extract_archive(archive_path: &Path, dest: &Path, kind: ArchiveKind) -> anyhow::Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create extract directory: {}", dest.display()))?;

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    match kind {
        ArchiveKind::TarXz => extract_tar_xz(BufReader::new(file), dest),
        ArchiveKind::Zip => extract_zip(file, dest),
    }
    .with_context(|| format!("Failed to extract archive: {}", archive_path.display()))
}

/// Drop the top-level directory; `None` for the top-level entry itself and
/// for paths that would escape the destination.
fn strip_top_level(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let mut stripped = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn extract_tar_xz<R: Read>(reader: R, dest: &Path) -> anyhow::Result<()> {
    let mut archive = Archive::new(XzDecoder::new(reader));
    archive.set_preserve_permissions(true);

    for entry in archive.entries().context("Failed to read tar entries")? {
        let mut entry = entry.context("Failed to read tar entry")?;
        let path = entry.path().context("Invalid tar entry path")?.into_owned();
        let Some(relative) = strip_top_level(&path) else {
            continue;
        };
        let outpath = dest.join(&relative);
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }
        entry
            .unpack(&outpath)
            .with_context(|| format!("Failed to unpack {}", outpath.display()))?;
    }
    Ok(())
}

fn extract_zip<R: Read + Seek>(reader: R, dest: &Path) -> anyhow::Result<()> {
    let mut archive = zip::ZipArchive::new(reader).context("Failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {}", i))?;

        // Skip entries with unsafe paths
        let Some(relative) = file.enclosed_name().and_then(|p| strip_top_level(&p)) else {
            continue;
        };
        let outpath = dest.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath)
                .with_context(|| format!("Failed to create directory: {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read zip entry: {}", file.name()))?;
        let mut outfile = File::create(&outpath)
            .with_context(|| format!("Failed to create file: {}", outpath.display()))?;
        outfile
            .write_all(&buffer)
            .with_context(|| format!("Failed to write file: {}", outpath.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strip_top_level() {
        assert_eq!(
            strip_top_level(Path::new("node-v20.0.0-linux-x64/bin/node")),
            Some(PathBuf::from("bin/node"))
        );
        assert_eq!(strip_top_level(Path::new("node-v20.0.0-linux-x64/")), None);
        assert_eq!(strip_top_level(Path::new("top/../../etc/passwd")), None);
    }

    #[test]
    fn test_extract_zip_strips_top_level() {
        let temp = TempDir::new().unwrap();
        let archive_path = temp.path().join("node.zip");
        {
            let file = File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            zip.add_directory("node-v20.0.0-win-x64/", options).unwrap();
            zip.start_file("node-v20.0.0-win-x64/node.exe", options)
                .unwrap();
            zip.write_all(b"binary").unwrap();
            zip.start_file(
                "node-v20.0.0-win-x64/node_modules/npm/bin/npm-cli.js",
                options,
            )
            .unwrap();
            zip.write_all(b"cli").unwrap();
            zip.finish().unwrap();
        }

        let dest = temp.path().join("out");
        extract_archive(&archive_path, &dest, ArchiveKind::Zip).unwrap();

        assert_eq!(fs::read(dest.join("node.exe")).unwrap(), b"binary");
        assert!(dest.join("node_modules/npm/bin/npm-cli.js").exists());
    }

    #[test]
    fn test_extract_rejects_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive_path = temp.path().join("broken.tar.xz");
        fs::write(&archive_path, b"not an archive").unwrap();

        let result = extract_archive(&archive_path, &temp.path().join("out"), ArchiveKind::TarXz);

        assert!(result.is_err());
    }
}
