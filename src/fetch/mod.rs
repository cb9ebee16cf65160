//! Remote retrieval of `PostgreSQL` archives.
//!
//! Strategies write the archive for a version to a caller-chosen path. The
//! write must be atomic with respect to readers: stage the bytes in a sibling
//! temporary file and rename it into place once complete. An archive that
//! already exists at the destination counts as success.

mod maven;

use std::fs::File;
use std::io::{ErrorKind, Write};

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result};
use tracing::debug;

use crate::error::FetchResult;
use crate::fs::ensure_parent_dir;
use crate::observability::FETCH_LOG_TARGET;
use crate::version::PostgresVersion;

pub use maven::MavenFetchStrategy;

/// Prefix of staging files written next to the final archive.
const STAGING_PREFIX: &str = ".partial-";

/// Retrieves the archive for a version into a destination path.
///
/// Strategies report failure instead of retrying; retry policy belongs to the
/// caller of [`ensure`](crate::ensure). Closures with the matching signature
/// are strategies too.
pub trait RemoteFetchStrategy: Send + Sync {
    /// Downloads the archive for `version` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error when the archive cannot be retrieved or written.
    fn fetch(&self, version: &PostgresVersion, destination: &Utf8Path) -> FetchResult<()>;
}

impl<F> RemoteFetchStrategy for F
where
    F: Fn(&PostgresVersion, &Utf8Path) -> FetchResult<()> + Send + Sync,
{
    fn fetch(&self, version: &PostgresVersion, destination: &Utf8Path) -> FetchResult<()> {
        self(version, destination)
    }
}

/// Writes a file through a sibling staging file and renames it into place.
///
/// Readers never observe a partially written `destination`. If another writer
/// wins the race the existing file is kept and this call succeeds.
///
/// # Errors
///
/// Returns an error when the parent directory cannot be created, `write`
/// fails, or the rename fails for a reason other than the destination
/// already existing.
///
/// # Examples
/// ```
/// use std::io::Write;
///
/// use camino::Utf8Path;
/// use pg_embed_runtime::write_archive_atomically;
///
/// let temp = tempfile::tempdir()?;
/// let root = Utf8Path::from_path(temp.path()).ok_or_else(|| color_eyre::eyre::eyre!("utf8"))?;
/// let target = root.join("13.2.0/archive.txz");
/// write_archive_atomically(&target, |file| Ok(file.write_all(b"archive")?))?;
/// assert_eq!(std::fs::read(&target)?, b"archive");
/// # Ok::<(), color_eyre::Report>(())
/// ```
pub fn write_archive_atomically<F>(destination: &Utf8Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let parent = ensure_parent_dir(destination)?;
    let mut staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(parent)
        .with_context(|| format!("create staging file in {parent}"))?;

    write(staging.as_file_mut())?;
    staging
        .as_file_mut()
        .flush()
        .and_then(|()| staging.as_file().sync_all())
        .with_context(|| format!("flush staging file for {destination}"))?;

    match staging.persist_noclobber(destination) {
        Ok(_) => {
            debug!(target: FETCH_LOG_TARGET, path = %destination, "archive persisted");
            Ok(())
        }
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            debug!(
                target: FETCH_LOG_TARGET,
                path = %destination,
                "archive already present, keeping existing file"
            );
            Ok(())
        }
        Err(err) => Err(err.error).with_context(|| format!("persist archive to {destination}")),
    }
}

#[cfg(test)]
mod tests;
