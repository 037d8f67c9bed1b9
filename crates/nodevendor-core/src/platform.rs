//! Platform naming for Node.js distribution archives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Arm64,
    Armv7l,
    Ppc64le,
    S390x,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarXz,
    Zip,
}

impl ArchiveKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarXz => "tar.xz",
            Self::Zip => "zip",
        }
    }
}

/// Target platform of a Node.js install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The running machine, when Node.js publishes binaries for it.
    pub fn current() -> Option<Self> {
        Self::detect().filter(Self::is_distributed)
    }

    /// Layout of the running machine for shims and probing.
    ///
    /// Always defined; unknown hosts get the layout of their OS family.
    pub fn host() -> Self {
        Self::detect().unwrap_or_else(|| {
            let os = if cfg!(windows) {
                Os::Windows
            } else if cfg!(target_os = "macos") {
                Os::Darwin
            } else {
                Os::Linux
            };
            Self { os, arch: Arch::X64 }
        })
    }

    fn detect() -> Option<Self> {
        let os = match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::Darwin,
            "windows" => Os::Windows,
            _ => return None,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            "arm" => Arch::Armv7l,
            "powerpc64" => Arch::Ppc64le,
            "s390x" => Arch::S390x,
            _ => return None,
        };
        Some(Self { os, arch })
    }

    /// Whether nodejs.org publishes binaries for this combination.
    pub fn is_distributed(&self) -> bool {
        match self.os {
            Os::Linux => true,
            Os::Darwin => matches!(self.arch, Arch::X64 | Arch::Arm64),
            Os::Windows => matches!(self.arch, Arch::X64 | Arch::Arm64),
        }
    }

    fn os_name(&self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "win",
        }
    }

    fn arch_name(&self) -> &'static str {
        match self.arch {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Armv7l => "armv7l",
            Arch::Ppc64le => "ppc64le",
            Arch::S390x => "s390x",
        }
    }

    /// Name used in archive file names, e.g. `linux-x64`.
    pub fn dist_name(&self) -> String {
        format!("{}-{}", self.os_name(), self.arch_name())
    }

    /// Key listed in the `files` array of `index.json`.
    pub fn index_file_key(&self) -> String {
        match self.os {
            Os::Linux => format!("linux-{}", self.arch_name()),
            Os::Darwin => format!("osx-{}-tar", self.arch_name()),
            Os::Windows => format!("win-{}-zip", self.arch_name()),
        }
    }

    pub fn archive_kind(&self) -> ArchiveKind {
        match self.os {
            Os::Windows => ArchiveKind::Zip,
            Os::Linux | Os::Darwin => ArchiveKind::TarXz,
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Archive file name for a version (without `v` prefix).
    pub fn archive_name(&self, version: &str) -> String {
        format!(
            "node-v{}-{}.{}",
            version,
            self.dist_name(),
            self.archive_kind().extension()
        )
    }

    /// Path of the `node` executable inside an install directory.
    pub fn node_binary(&self, install_dir: &Path) -> PathBuf {
        if self.is_windows() {
            install_dir.join("node.exe")
        } else {
            install_dir.join("bin").join("node")
        }
    }

    /// Path of npm's CLI script inside an install directory.
    pub fn npm_cli_script(&self, install_dir: &Path) -> PathBuf {
        self.npm_cli_relative()
            .iter()
            .fold(install_dir.to_path_buf(), |path, part| path.join(part))
    }

    /// Components of the npm CLI script path relative to the install dir.
    pub fn npm_cli_relative(&self) -> &'static [&'static str] {
        if self.is_windows() {
            &["node_modules", "npm", "bin", "npm-cli.js"]
        } else {
            &["lib", "node_modules", "npm", "bin", "npm-cli.js"]
        }
    }

    /// Components of the node binary path relative to the install dir.
    pub fn node_binary_relative(&self) -> &'static [&'static str] {
        if self.is_windows() {
            &["node.exe"]
        } else {
            &["bin", "node"]
        }
    }
}

/// Error for a host Node.js publishes no binaries for.
pub(crate) fn no_distribution_error() -> anyhow::Error {
    anyhow::anyhow!(
        "Node.js does not publish binaries for {}-{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dist_name())
    }
}
