//! Extraction of cached archives into a runtime directory.

use std::fs::File;
use std::io::BufReader;

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result, bail};
use tracing::{debug, info_span};
use xz2::read::XzDecoder;

use crate::error::{UnpackError, UnpackResult};
use crate::fs::ensure_dir_exists;
use crate::observability::UNPACK_LOG_TARGET;

/// Extracts an archive into a destination directory.
///
/// Implementations create the destination when missing, keep the archive's
/// relative layout and executable bits, and never report success for an
/// incomplete extraction. Closures with the matching signature are
/// unpackers too.
pub trait ArchiveUnpacker: Send + Sync {
    /// Extracts every entry of `source` below `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error naming both paths when extraction cannot complete.
    fn unpack(&self, source: &Utf8Path, destination: &Utf8Path) -> UnpackResult<()>;
}

impl<F> ArchiveUnpacker for F
where
    F: Fn(&Utf8Path, &Utf8Path) -> UnpackResult<()> + Send + Sync,
{
    fn unpack(&self, source: &Utf8Path, destination: &Utf8Path) -> UnpackResult<()> {
        self(source, destination)
    }
}

/// Default unpacker for the xz-compressed tarballs published by the
/// distributor.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use pg_embed_runtime::{ArchiveUnpacker, TarXzUnpacker};
///
/// TarXzUnpacker.unpack(
///     Utf8Path::new("/cache/13.2.0/postgres.txz"),
///     Utf8Path::new("/tmp/pg-runtime"),
/// )?;
/// # Ok::<(), pg_embed_runtime::UnpackError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TarXzUnpacker;

impl ArchiveUnpacker for TarXzUnpacker {
    fn unpack(&self, source: &Utf8Path, destination: &Utf8Path) -> UnpackResult<()> {
        let span = info_span!(
            target: UNPACK_LOG_TARGET,
            "unpack_archive",
            %source,
            %destination
        );
        let _entered = span.enter();
        extract_tar_xz(source, destination)
            .wrap_err_with(|| {
                format!("unable to extract postgres archive {source} to {destination}")
            })
            .map_err(UnpackError::from)
    }
}

fn extract_tar_xz(source: &Utf8Path, destination: &Utf8Path) -> Result<()> {
    ensure_dir_exists(destination)?;
    let file = File::open(source).with_context(|| format!("open {source}"))?;
    let mut archive = tar::Archive::new(XzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut extracted = 0_usize;
    for entry_result in archive.entries().context("read archive entries")? {
        let mut entry = entry_result.context("read archive entry")?;
        let path = entry
            .path()
            .context("decode archive entry path")?
            .display()
            .to_string();
        let unpacked = entry
            .unpack_in(destination.as_std_path())
            .with_context(|| format!("write {path}"))?;
        if !unpacked {
            bail!("archive entry {path} escapes {destination}");
        }
        extracted += 1;
    }

    debug!(target: UNPACK_LOG_TARGET, entries = extracted, "archive extracted");
    Ok(())
}

#[cfg(test)]
mod tests;
