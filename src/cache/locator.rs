//! Maps a version onto the path of its cached archive.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use super::config::resolve_cache_root;
use crate::platform::Platform;
use crate::version::PostgresVersion;

/// Produces the expected cache path for a version's archive.
///
/// Implementations must be pure: the same version always maps to the same
/// path and no filesystem access happens. The caller decides whether the
/// file exists. Closures with the matching signature are locators too.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use pg_embed_runtime::{CacheLocator, PostgresVersion};
///
/// let locator = |version: &PostgresVersion| Utf8PathBuf::from(format!("/cache/{version}.txz"));
/// assert_eq!(locator.locate(&PostgresVersion::V12).as_str(), "/cache/12.6.0.txz");
/// ```
pub trait CacheLocator: Send + Sync {
    /// Returns where the archive for `version` lives when cached.
    fn locate(&self, version: &PostgresVersion) -> Utf8PathBuf;
}

impl<F> CacheLocator for F
where
    F: Fn(&PostgresVersion) -> Utf8PathBuf + Send + Sync,
{
    fn locate(&self, version: &PostgresVersion) -> Utf8PathBuf {
        self(version)
    }
}

/// Returns the archive file name published for `version` on `platform`.
///
/// # Examples
/// ```
/// use pg_embed_runtime::{Platform, PostgresVersion, archive_file_name};
///
/// let name = archive_file_name(&PostgresVersion::V13, &Platform::new("linux", "amd64"));
/// assert_eq!(name, "embedded-postgres-binaries-linux-amd64-13.2.0.txz");
/// ```
#[must_use]
pub fn archive_file_name(version: &PostgresVersion, platform: &Platform) -> String {
    format!(
        "embedded-postgres-binaries-{}-{}-{version}.txz",
        platform.os(),
        platform.arch()
    )
}

/// Default locator laying archives out as `<root>/<version>/<archive-name>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DefaultCacheLocator {
    root: Utf8PathBuf,
    platform: Platform,
}

impl DefaultCacheLocator {
    /// Uses the root from [`resolve_cache_root`] and the host platform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(resolve_cache_root())
    }

    /// Uses an explicit cache root and the host platform.
    #[must_use]
    pub fn with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            platform: Platform::current(),
        }
    }

    /// Overrides the platform used to name archives.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Cache root shared by every version.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl Default for DefaultCacheLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultCacheLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCacheLocator")
            .field("root", &self.root.as_str())
            .field("platform", &self.platform.to_string())
            .finish()
    }
}

impl CacheLocator for DefaultCacheLocator {
    fn locate(&self, version: &PostgresVersion) -> Utf8PathBuf {
        self.root
            .join(version.as_str())
            .join(archive_file_name(version, &self.platform))
    }
}
