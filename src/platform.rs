//! Target platform qualifiers for published `PostgreSQL` binaries.
//!
//! Distributions are published per operating system and CPU architecture
//! using the naming from the zonky embedded-postgres-binaries project.

use std::fmt;
use std::fs;
use std::sync::OnceLock;

/// Operating system and architecture pair naming a binary distribution.
///
/// # Examples
/// ```
/// use pg_embed_runtime::Platform;
///
/// let platform = Platform::new("linux", "amd64");
/// assert_eq!(platform.to_string(), "linux-amd64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Builds a platform from explicit qualifiers.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detects the qualifiers for the running host.
    ///
    /// Detection runs once per process; later calls clone the cached value.
    #[must_use]
    pub fn current() -> Self {
        static HOST: OnceLock<Platform> = OnceLock::new();
        HOST.get_or_init(Self::detect).clone()
    }

    fn detect() -> Self {
        let os = os_qualifier(std::env::consts::OS);
        let mut arch = arch_qualifier(std::env::consts::ARCH).to_owned();
        if os == "linux" && is_alpine_host() {
            arch.push_str("-alpine");
        }
        Self::new(os, arch)
    }

    /// Operating system qualifier, e.g. `linux`.
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Architecture qualifier, e.g. `arm64v8`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

fn os_qualifier(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_qualifier(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64v8",
        "x86" => "i386",
        "arm" => "arm32v7",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        other => other,
    }
}

fn is_alpine_host() -> bool {
    fs::read_to_string("/etc/os-release")
        .is_ok_and(|contents| contents.lines().any(|line| line.trim() == "ID=alpine"))
}
