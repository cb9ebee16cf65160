//! Isolated cache and runtime directories for acquisition tests.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, Result, eyre};
use tempfile::TempDir;

use pg_embed_runtime::{
    CacheLocator, DefaultCacheLocator, Platform, PostgresVersion, RuntimeConfig,
};

/// Provides a temporary tree holding one shared archive cache and any number
/// of runtime directories, so scenarios never touch the user's cache.
#[derive(Debug)]
pub struct AcquisitionSandbox {
    _guard: TempDir,
    root: Utf8PathBuf,
}

impl AcquisitionSandbox {
    /// Creates a sandbox under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its path is not
    /// valid UTF-8.
    pub fn new(prefix: &str) -> Result<Self> {
        let guard = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .context("create sandbox tempdir")?;
        let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf())
            .map_err(|raw| eyre!("sandbox path {} is not valid UTF-8", raw.display()))?;
        Ok(Self {
            _guard: guard,
            root,
        })
    }

    /// Root of the sandbox tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Root of the shared archive cache.
    pub fn cache_root(&self) -> Utf8PathBuf {
        self.root.join("cache")
    }

    /// Runtime directory dedicated to the instance called `name`.
    pub fn runtime_dir(&self, name: &str) -> Utf8PathBuf {
        self.root.join("runtimes").join(name)
    }

    /// Default cache layout rooted in the sandbox, pinned to `linux-amd64`.
    pub fn locator(&self) -> DefaultCacheLocator {
        DefaultCacheLocator::with_root(self.cache_root())
            .with_platform(Platform::new("linux", "amd64"))
    }

    /// Cached archive path for `version`.
    pub fn archive_path(&self, version: &PostgresVersion) -> Utf8PathBuf {
        self.locator().locate(version)
    }

    /// Configuration for instance `name` using the sandbox cache.
    pub fn config(&self, name: &str) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_runtime_path(self.runtime_dir(name))
            .with_cache_locator(self.locator())
    }
}
