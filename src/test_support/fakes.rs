//! Counting strategy doubles shared by unit and integration tests.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result, eyre};

use super::archive::fake_distribution_bytes;
use crate::error::{FetchResult, UnpackResult};
use crate::fetch::{RemoteFetchStrategy, write_archive_atomically};
use crate::unpack::{ArchiveUnpacker, TarXzUnpacker};
use crate::version::PostgresVersion;

/// Fetch double that writes a fake distribution and counts invocations.
///
/// Clones share the counter, so a clone handed to a config can be inspected
/// through the original.
#[derive(Debug, Clone)]
pub struct CountingFetch {
    calls: Arc<AtomicUsize>,
    archive: Arc<Vec<u8>>,
    chunk_delay: Option<Duration>,
    fail_with: Option<&'static str>,
}

impl CountingFetch {
    /// Builds a double serving [`fake_distribution_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the fake archive cannot be encoded.
    pub fn new() -> Result<Self> {
        Ok(Self {
            calls: Arc::new(AtomicUsize::new(0)),
            archive: Arc::new(fake_distribution_bytes()?),
            chunk_delay: None,
            fail_with: None,
        })
    }

    /// Writes the archive in small chunks, sleeping between them, so
    /// concurrent readers have a window to observe partial writes.
    #[must_use]
    pub const fn slow(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Makes every fetch fail with `message` without writing anything.
    #[must_use]
    pub const fn failing(mut self, message: &'static str) -> Self {
        self.fail_with = Some(message);
        self
    }

    /// Number of fetches performed so far across all clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bytes written by every successful fetch.
    #[must_use]
    pub fn archive(&self) -> &[u8] {
        &self.archive
    }

    fn write_to(&self, file: &mut std::fs::File) -> Result<()> {
        let Some(delay) = self.chunk_delay else {
            return file.write_all(&self.archive).context("write archive");
        };
        for chunk in self.archive.chunks(512) {
            file.write_all(chunk).context("write archive chunk")?;
            file.flush().context("flush archive chunk")?;
            thread::sleep(delay);
        }
        Ok(())
    }
}

impl RemoteFetchStrategy for CountingFetch {
    fn fetch(&self, _version: &PostgresVersion, destination: &Utf8Path) -> FetchResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with {
            return Err(eyre!(message).into());
        }
        write_archive_atomically(destination, |file| self.write_to(file))?;
        Ok(())
    }
}

/// Unpacker double that delegates to [`TarXzUnpacker`] and counts calls.
#[derive(Debug, Clone, Default)]
pub struct CountingUnpacker {
    calls: Arc<AtomicUsize>,
}

impl CountingUnpacker {
    /// Builds a double with a zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of extractions performed so far across all clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArchiveUnpacker for CountingUnpacker {
    fn unpack(&self, source: &Utf8Path, destination: &Utf8Path) -> UnpackResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TarXzUnpacker.unpack(source, destination)
    }
}
