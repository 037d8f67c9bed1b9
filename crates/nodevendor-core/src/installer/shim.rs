//! Bin-directory shims forwarding to the selected runtime.
//!
//! Shim content depends only on the bin directory and the selected install,
//! so regenerating them is idempotent; files whose bytes already match are
//! not rewritten.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::fs::{remove_path_if_exists, write_if_changed};
use crate::platform::Platform;

/// Every name a shim can have, on any platform.
pub const SHIM_NAMES: [&str; 4] = ["node", "npm", "node.bat", "npm.bat"];

const HEADER: &str = "Generated by nodevendor. Do not edit.";

/// The install the shims point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShimTarget {
    /// Executables found on `PATH`.
    Global { node: PathBuf, npm: PathBuf },
    /// Install extracted into the project's target directory.
    Local { target_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shim {
    pub name: &'static str,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct ShimReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Shims this platform does not use, left over from an earlier run.
    pub removed: Vec<PathBuf>,
}

/// Render the shims for `target` as seen from `bin_dir`.
pub fn render_shims(bin_dir: &Path, target: &ShimTarget, platform: Platform) -> Vec<Shim> {
    let mut shims = vec![
        Shim {
            name: "node",
            content: render_sh(bin_dir, target, platform, Tool::Node),
        },
        Shim {
            name: "npm",
            content: render_sh(bin_dir, target, platform, Tool::Npm),
        },
    ];
    if platform.is_windows() {
        shims.push(Shim {
            name: "node.bat",
            content: render_bat(bin_dir, target, platform, Tool::Node),
        });
        shims.push(Shim {
            name: "npm.bat",
            content: render_bat(bin_dir, target, platform, Tool::Npm),
        });
    }
    shims
}

/// Write (or keep) the shims in `bin_dir` and drop any other known shim.
pub fn write_bin_scripts(
    bin_dir: &Path,
    target: &ShimTarget,
    platform: Platform,
) -> anyhow::Result<ShimReport> {
    std::fs::create_dir_all(bin_dir)
        .with_context(|| format!("Failed to create bin directory: {}", bin_dir.display()))?;

    let mut report = ShimReport::default();
    let shims = render_shims(bin_dir, target, platform);
    for shim in &shims {
        let path = bin_dir.join(shim.name);
        if write_if_changed(&path, shim.content.as_bytes())? {
            make_executable(&path)?;
            report.written.push(path);
        } else {
            report.unchanged.push(path);
        }
    }

    for name in SHIM_NAMES {
        if shims.iter().any(|shim| shim.name == name) {
            continue;
        }
        let path = bin_dir.join(name);
        if remove_path_if_exists(&path)? {
            tracing::debug!("Removed stale shim {}", path.display());
            report.removed.push(path);
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy)]
enum Tool {
    Node,
    Npm,
}

/// Location of a file inside the target dir, seen from the bin dir.
enum Anchor {
    /// Relative to the shim's own directory.
    Relative(Vec<String>),
    Absolute(PathBuf),
}

fn anchor(bin_dir: &Path, target_dir: &Path, inner: &[&str]) -> Anchor {
    match relative_path(bin_dir, target_dir) {
        Some(relative) => {
            let mut parts: Vec<String> = relative
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            parts.extend(inner.iter().map(|s| s.to_string()));
            Anchor::Relative(parts)
        }
        None => Anchor::Absolute(
            inner
                .iter()
                .fold(target_dir.to_path_buf(), |path, part| path.join(part)),
        ),
    }
}

fn render_sh(bin_dir: &Path, target: &ShimTarget, platform: Platform, tool: Tool) -> String {
    let mut uses_basedir = false;
    let mut sh_path = |anchor: Anchor| match anchor {
        Anchor::Relative(parts) => {
            uses_basedir = true;
            format!("\"$basedir/{}\"", sh_escape(&parts.join("/")))
        }
        Anchor::Absolute(path) => format!("\"{}\"", sh_escape(&forward_slashes(&path))),
    };

    let command = match (target, tool) {
        (ShimTarget::Global { node, .. }, Tool::Node) => sh_path(Anchor::Absolute(node.clone())),
        (ShimTarget::Global { npm, .. }, Tool::Npm) => sh_path(Anchor::Absolute(npm.clone())),
        (ShimTarget::Local { target_dir }, Tool::Node) => {
            sh_path(anchor(bin_dir, target_dir, platform.node_binary_relative()))
        }
        (ShimTarget::Local { target_dir }, Tool::Npm) => {
            let node = sh_path(anchor(bin_dir, target_dir, platform.node_binary_relative()));
            let cli = sh_path(anchor(bin_dir, target_dir, platform.npm_cli_relative()));
            format!("{} {}", node, cli)
        }
    };

    let mut script = format!("#!/bin/sh\n# {}\n", HEADER);
    if uses_basedir {
        script.push_str("basedir=$(dirname \"$0\")\n");
    }
    script.push_str(&format!("exec {} \"$@\"\n", command));
    script
}

fn render_bat(bin_dir: &Path, target: &ShimTarget, platform: Platform, tool: Tool) -> String {
    let bat_path = |anchor: Anchor| match anchor {
        Anchor::Relative(parts) => format!("\"%~dp0{}\"", bat_escape(&parts.join("\\"))),
        Anchor::Absolute(path) => format!("\"{}\"", bat_escape(&path.to_string_lossy())),
    };

    let command = match (target, tool) {
        (ShimTarget::Global { node, .. }, Tool::Node) => bat_path(Anchor::Absolute(node.clone())),
        (ShimTarget::Global { npm, .. }, Tool::Npm) => {
            format!("CALL {}", bat_path(Anchor::Absolute(npm.clone())))
        }
        (ShimTarget::Local { target_dir }, Tool::Node) => {
            bat_path(anchor(bin_dir, target_dir, platform.node_binary_relative()))
        }
        (ShimTarget::Local { target_dir }, Tool::Npm) => format!(
            "{} {}",
            bat_path(anchor(bin_dir, target_dir, platform.node_binary_relative())),
            bat_path(anchor(bin_dir, target_dir, platform.npm_cli_relative()))
        ),
    };

    format!("@ECHO OFF\r\nREM {}\r\n{} %*\r\n", HEADER, command)
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn sh_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn bat_escape(raw: &str) -> String {
    raw.replace('%', "%%")
}

/// Lexical path from directory `from` to `to`. `None` when the two do not
/// share a root (relative inputs, different drives).
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    if !from.is_absolute() || !to.is_absolute() {
        return None;
    }

    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();

    if from.first() != to.first() {
        return None;
    }

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to make executable: {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    const LINUX: Platform = Platform {
        os: Os::Linux,
        arch: Arch::X64,
    };
    const WINDOWS: Platform = Platform {
        os: Os::Windows,
        arch: Arch::X64,
    };

    #[test]
    #[cfg(unix)]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/p/vendor/bin"), Path::new("/p/vendor/nodejs/nodejs")),
            Some(PathBuf::from("../nodejs/nodejs"))
        );
        assert_eq!(
            relative_path(Path::new("/p/bin"), Path::new("/p/bin")),
            Some(PathBuf::from("."))
        );
        assert_eq!(relative_path(Path::new("p/bin"), Path::new("/p")), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_local_unix_shims_are_relative() {
        let target = ShimTarget::Local {
            target_dir: PathBuf::from("/p/vendor/nodejs/nodejs"),
        };

        let shims = render_shims(Path::new("/p/vendor/bin"), &target, LINUX);

        assert_eq!(shims.len(), 2);
        assert_eq!(
            shims[0].content,
            "#!/bin/sh\n\
             # Generated by nodevendor. Do not edit.\n\
             basedir=$(dirname \"$0\")\n\
             exec \"$basedir/../nodejs/nodejs/bin/node\" \"$@\"\n"
        );
        assert!(shims[1].content.contains(
            "exec \"$basedir/../nodejs/nodejs/bin/node\" \
             \"$basedir/../nodejs/nodejs/lib/node_modules/npm/bin/npm-cli.js\" \"$@\""
        ));
    }

    #[test]
    fn test_global_shims_use_absolute_paths() {
        let target = ShimTarget::Global {
            node: PathBuf::from("/usr/bin/node"),
            npm: PathBuf::from("/usr/bin/npm"),
        };

        let shims = render_shims(Path::new("/p/vendor/bin"), &target, LINUX);

        assert!(!shims[0].content.contains("basedir"));
        assert!(shims[0].content.contains("exec \"/usr/bin/node\" \"$@\""));
        assert!(shims[1].content.contains("exec \"/usr/bin/npm\" \"$@\""));
    }

    #[test]
    #[cfg(unix)]
    fn test_windows_adds_batch_variants() {
        let target = ShimTarget::Local {
            target_dir: PathBuf::from("/p/vendor/nodejs/nodejs"),
        };

        let shims = render_shims(Path::new("/p/vendor/bin"), &target, WINDOWS);
        let names: Vec<&str> = shims.iter().map(|s| s.name).collect();

        assert_eq!(names, SHIM_NAMES.to_vec());
        assert!(shims[2].content.contains("\"%~dp0..\\nodejs\\nodejs\\node.exe\" %*"));
        assert!(shims[3].content.contains(
            "\"%~dp0..\\nodejs\\nodejs\\node.exe\" \
             \"%~dp0..\\nodejs\\nodejs\\node_modules\\npm\\bin\\npm-cli.js\" %*"
        ));
    }

    #[test]
    fn test_switching_platform_removes_batch_shims() {
        let temp = tempfile::TempDir::new().unwrap();
        let bin_dir = temp.path().join("bin");
        let target = ShimTarget::Local {
            target_dir: temp.path().join("nodejs"),
        };

        let report = write_bin_scripts(&bin_dir, &target, WINDOWS).unwrap();
        assert_eq!(report.written.len(), SHIM_NAMES.len());
        assert!(bin_dir.join("npm.bat").exists());

        std::fs::write(bin_dir.join("phpunit.bat"), "other tool").unwrap();
        let report = write_bin_scripts(&bin_dir, &target, LINUX).unwrap();

        assert_eq!(
            report.removed,
            vec![bin_dir.join("node.bat"), bin_dir.join("npm.bat")]
        );
        assert!(!bin_dir.join("node.bat").exists());
        assert!(!bin_dir.join("npm.bat").exists());
        assert!(bin_dir.join("node").exists());
        assert!(bin_dir.join("phpunit.bat").exists());

        let report = write_bin_scripts(&bin_dir, &target, LINUX).unwrap();
        assert_eq!(report.unchanged.len(), 2);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_sh_escape() {
        assert_eq!(sh_escape("a$b\"c"), "a\\$b\\\"c");
    }
}
