//! Marker recording which release a runtime directory holds.

use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::version::PostgresVersion;

/// File written into a runtime directory once unpacking has completed.
pub const RUNTIME_MARKER: &str = ".pg-embed-runtime";

#[derive(Debug, Serialize, Deserialize)]
struct RuntimeMarker {
    version: PostgresVersion,
    archive: Utf8PathBuf,
}

/// Returns the release a completed unpack left in `runtime_dir`.
///
/// Directories without a readable marker report `None`, including ones whose
/// extraction was interrupted.
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use pg_embed_runtime::installed_version;
///
/// assert!(installed_version(Utf8Path::new("/nonexistent/runtime")).is_none());
/// ```
#[must_use]
pub fn installed_version(runtime_dir: &Utf8Path) -> Option<PostgresVersion> {
    let contents = fs::read(runtime_dir.join(RUNTIME_MARKER)).ok()?;
    serde_json::from_slice::<RuntimeMarker>(&contents)
        .ok()
        .map(|marker| marker.version)
}

pub(crate) fn is_usable(runtime_dir: &Utf8Path, version: &PostgresVersion) -> bool {
    installed_version(runtime_dir).is_some_and(|installed| &installed == version)
}

/// Withdraws the marker so an interrupted unpack never looks complete.
pub(crate) fn clear(runtime_dir: &Utf8Path) -> Result<()> {
    let marker = runtime_dir.join(RUNTIME_MARKER);
    match fs::remove_file(&marker) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove runtime marker {marker}")),
    }
}

pub(crate) fn write(
    runtime_dir: &Utf8Path,
    version: &PostgresVersion,
    archive: &Utf8Path,
) -> Result<()> {
    let marker = runtime_dir.join(RUNTIME_MARKER);
    let record = RuntimeMarker {
        version: version.clone(),
        archive: archive.to_path_buf(),
    };
    let contents = serde_json::to_vec(&record).context("serialise runtime marker")?;
    fs::write(&marker, contents).with_context(|| format!("failed to write runtime marker {marker}"))
}
