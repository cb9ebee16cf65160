//! Builds miniature `PostgreSQL` distributions for tests.
//!
//! The archives mirror the published layout closely enough for the
//! acquisition pipeline: executables under `bin/`, libraries under `lib/`,
//! and support files under `share/`.

use std::io::{self, Write};

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result};
use tar::{EntryType, Header};
use xz2::write::XzEncoder;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::fetch::write_archive_atomically;

/// Files contained in the fake distribution with their modes.
pub const FAKE_DISTRIBUTION_FILES: &[(&str, u32)] = &[
    ("bin/pg_ctl", 0o755),
    ("bin/postgres", 0o755),
    ("bin/initdb", 0o755),
    ("lib/libpq.so.5", 0o644),
    ("share/postgresql/postgres.bki", 0o644),
];

const DIRECTORIES: &[&str] = &["bin/", "lib/", "share/", "share/postgresql/"];

/// Returns an xz-compressed tarball resembling a published distribution.
///
/// # Errors
///
/// Returns an error if the archive cannot be encoded.
pub fn fake_distribution_bytes() -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(XzEncoder::new(Vec::new(), 6));

    for dir in DIRECTORIES {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, dir, io::empty())
            .with_context(|| format!("append {dir}"))?;
    }

    for (path, mode) in FAKE_DISTRIBUTION_FILES {
        let contents = format!("fake {path}\n");
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .with_context(|| format!("append {path}"))?;
    }

    let encoder = builder.into_inner().context("finish tar stream")?;
    encoder.finish().context("finish xz stream")
}

/// Writes [`fake_distribution_bytes`] to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the archive cannot be built or written.
pub fn write_fake_distribution(path: &Utf8Path) -> Result<()> {
    let bytes = fake_distribution_bytes()?;
    write_archive_atomically(path, |file| {
        file.write_all(&bytes).context("write fake distribution")
    })
}

/// Wraps `txz` in a jar the way the Maven repository publishes it.
///
/// # Errors
///
/// Returns an error if the zip stream cannot be written.
pub fn fake_jar_bytes(txz: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer
        .start_file("META-INF/MANIFEST.MF", options)
        .context("start manifest")?;
    writer
        .write_all(b"Manifest-Version: 1.0\n")
        .context("write manifest")?;
    writer
        .start_file("postgres-linux-x86_64.txz", options)
        .context("start archive entry")?;
    writer.write_all(txz).context("write archive entry")?;
    Ok(writer.finish().context("finish jar")?.into_inner())
}
