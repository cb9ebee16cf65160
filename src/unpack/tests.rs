//! Tests for archive extraction.

use super::*;
use crate::test_support::{FAKE_DISTRIBUTION_FILES, write_fake_distribution};
use camino::Utf8PathBuf;
use std::fs;
use tar::{EntryType, Header};
use tempfile::{TempDir, tempdir};
use xz2::write::XzEncoder;

fn sandbox() -> (TempDir, Utf8PathBuf) {
    let temp = tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
    (temp, root)
}

#[test]
fn unpack_creates_destination_and_extracts_every_file() {
    let (_temp, root) = sandbox();
    let archive = root.join("cache/13.2.0/postgres.txz");
    write_fake_distribution(&archive).expect("write archive");
    let destination = root.join("runtime/nested");

    TarXzUnpacker
        .unpack(&archive, &destination)
        .expect("unpack archive");

    for (path, _) in FAKE_DISTRIBUTION_FILES {
        assert!(destination.join(path).is_file(), "{path} should be extracted");
    }
}

#[cfg(unix)]
#[test]
fn unpack_preserves_executable_bits() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, root) = sandbox();
    let archive = root.join("postgres.txz");
    write_fake_distribution(&archive).expect("write archive");
    let destination = root.join("runtime");

    TarXzUnpacker
        .unpack(&archive, &destination)
        .expect("unpack archive");

    let mode = fs::metadata(destination.join("bin/pg_ctl"))
        .expect("pg_ctl metadata")
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0, "pg_ctl must stay executable, mode {mode:o}");
}

#[test]
fn unpack_reports_source_and_destination_for_corrupt_archive() {
    let (_temp, root) = sandbox();
    let archive = root.join("corrupt.txz");
    fs::write(&archive, b"definitely not xz").expect("write corrupt archive");
    let destination = root.join("runtime");

    let err = TarXzUnpacker
        .unpack(&archive, &destination)
        .expect_err("corrupt archive must fail");

    let message = err.to_string();
    assert!(message.contains(archive.as_str()), "{message}");
    assert!(message.contains(destination.as_str()), "{message}");
}

#[test]
fn unpack_fails_for_truncated_archive() {
    let (_temp, root) = sandbox();
    let archive = root.join("truncated.txz");
    let bytes = crate::test_support::fake_distribution_bytes().expect("archive bytes");
    let (head, _) = bytes.split_at(bytes.len() / 2);
    fs::write(&archive, head).expect("write truncated archive");

    let result = TarXzUnpacker.unpack(&archive, &root.join("runtime"));
    assert!(result.is_err(), "partial archive must not report success");
}

#[test]
fn unpack_fails_for_missing_archive() {
    let (_temp, root) = sandbox();
    let result = TarXzUnpacker.unpack(&root.join("missing.txz"), &root.join("runtime"));
    assert!(result.is_err());
}

#[test]
fn closures_act_as_unpackers() {
    let unpacker = |source: &Utf8Path, destination: &Utf8Path| -> UnpackResult<()> {
        assert_eq!(source.as_str(), "/src.txz");
        assert_eq!(destination.as_str(), "/dst");
        Ok(())
    };
    unpacker
        .unpack(Utf8Path::new("/src.txz"), Utf8Path::new("/dst"))
        .expect("closure unpacker");
}

/// Builds a `.txz` whose single entry is named `name` verbatim.
fn archive_with_raw_entry(name: &[u8]) -> Vec<u8> {
    let contents = b"outside";
    let mut header = Header::new_gnu();
    header
        .as_mut_bytes()
        .get_mut(..name.len())
        .expect("name fits the header")
        .copy_from_slice(name);
    header.set_entry_type(EntryType::Regular);
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();

    let mut builder = tar::Builder::new(XzEncoder::new(Vec::new(), 6));
    builder
        .append(&header, contents.as_slice())
        .expect("append entry");
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish xz")
}

#[test]
fn unpack_refuses_entries_escaping_the_destination() {
    let (_temp, root) = sandbox();
    let archive = root.join("escape.txz");
    fs::write(&archive, archive_with_raw_entry(b"../escape")).expect("write archive");
    let destination = root.join("runtime");

    let err = TarXzUnpacker
        .unpack(&archive, &destination)
        .expect_err("escaping entry must be refused");

    let detail = format!("{err:?}");
    assert!(detail.contains("escapes"), "{detail}");
    assert!(!root.join("escape").exists(), "nothing may land outside");
    let inside = fs::read_dir(&destination).expect("read destination").count();
    assert_eq!(inside, 0);
}
