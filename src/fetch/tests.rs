//! Tests for remote fetch strategies and atomic archive writes.

use super::maven::{copy_txz_entry, hex_digest};
use super::*;
use crate::platform::Platform;
use crate::test_support::{fake_distribution_bytes, fake_jar_bytes};
use camino::Utf8PathBuf;
use std::io::Write as _;
use std::net::TcpListener;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sandbox() -> (TempDir, Utf8PathBuf) {
    let temp = tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
    (temp, root)
}

/// Mounts a `GET` route answering `body` exactly once.
async fn publish(server: &MockServer, route: String, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Runs the blocking strategy against `server` off the async executor.
async fn fetch_from(
    server: &MockServer,
    version: PostgresVersion,
    destination: Utf8PathBuf,
) -> FetchResult<()> {
    let strategy = strategy_for(&server.uri());
    tokio::task::spawn_blocking(move || strategy.fetch(&version, &destination))
        .await
        .expect("fetch task")
}

fn strategy_for(base: &str) -> MavenFetchStrategy {
    MavenFetchStrategy::new()
        .with_repository_url(base)
        .with_platform(Platform::new("linux", "amd64"))
}

fn jar_path(version: &str) -> String {
    format!(
        "/io/zonky/test/postgres/embedded-postgres-binaries-linux-amd64/{version}/embedded-postgres-binaries-linux-amd64-{version}.jar"
    )
}

#[test]
fn write_archive_atomically_creates_parent_and_file() {
    let (_temp, root) = sandbox();
    let target = root.join("13.2.0/archive.txz");

    write_archive_atomically(&target, |file| Ok(file.write_all(b"complete")?))
        .expect("write archive");

    assert_eq!(std::fs::read(&target).expect("read archive"), b"complete");
}

#[test]
fn write_archive_atomically_keeps_existing_archive() {
    let (_temp, root) = sandbox();
    let target = root.join("archive.txz");
    std::fs::write(&target, b"first").expect("seed archive");

    write_archive_atomically(&target, |file| Ok(file.write_all(b"second")?))
        .expect("existing archive counts as success");

    assert_eq!(std::fs::read(&target).expect("read archive"), b"first");
}

#[test]
fn write_archive_atomically_leaves_no_file_when_writer_fails() {
    let (_temp, root) = sandbox();
    let target = root.join("archive.txz");

    let result = write_archive_atomically(&target, |file| {
        file.write_all(b"half")?;
        Err(color_eyre::eyre::eyre!("connection reset"))
    });

    assert!(result.is_err());
    assert!(!target.exists(), "failed writes must not publish the archive");
    let leftovers = std::fs::read_dir(&root).expect("read root").count();
    assert_eq!(leftovers, 0, "staging file should be removed");
}

#[test]
fn jar_url_follows_maven_layout() {
    let url = strategy_for("https://repo.example/maven2/").jar_url(&PostgresVersion::V9);
    assert_eq!(url, format!("https://repo.example/maven2{}", jar_path("9.6.21")));
}

#[test]
fn copy_txz_entry_extracts_embedded_archive() {
    let (_temp, root) = sandbox();
    let txz = fake_distribution_bytes().expect("txz bytes");
    let jar = fake_jar_bytes(&txz).expect("jar bytes");
    let target = root.join("out.txz");
    let mut file = std::fs::File::create(&target).expect("create target");

    copy_txz_entry(&jar, "http://repo/jar", &mut file).expect("copy entry");

    assert_eq!(std::fs::read(&target).expect("read target"), txz);
}

#[test]
fn copy_txz_entry_rejects_jar_without_archive() {
    let (_temp, root) = sandbox();
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("README", zip::write::SimpleFileOptions::default())
        .expect("start entry");
    writer.write_all(b"no binaries here").expect("write entry");
    let jar = writer.finish().expect("finish jar").into_inner();
    let mut file = std::fs::File::create(root.join("out.txz")).expect("create target");

    let err = copy_txz_entry(&jar, "http://repo/jar", &mut file).expect_err("no txz entry");
    assert!(err.to_string().contains("cannot find binary"), "{err}");
}

#[tokio::test]
async fn maven_fetch_downloads_and_verifies_archive() {
    let txz = fake_distribution_bytes().expect("txz bytes");
    let jar = fake_jar_bytes(&txz).expect("jar bytes");
    let checksum = format!("{}  embedded.jar\n", hex_digest(&jar));
    let server = MockServer::start().await;
    publish(&server, jar_path("12.6.0"), jar).await;
    publish(
        &server,
        format!("{}.sha256", jar_path("12.6.0")),
        checksum.into_bytes(),
    )
    .await;
    let (_temp, root) = sandbox();
    let destination = root.join("12.6.0/archive.txz");

    fetch_from(&server, PostgresVersion::V12, destination.clone())
        .await
        .expect("fetch archive");

    assert_eq!(std::fs::read(&destination).expect("read archive"), txz);
}

#[tokio::test]
async fn maven_fetch_skips_verification_without_published_checksum() {
    let txz = fake_distribution_bytes().expect("txz bytes");
    let server = MockServer::start().await;
    publish(
        &server,
        jar_path("11.11.0"),
        fake_jar_bytes(&txz).expect("jar"),
    )
    .await;
    let (_temp, root) = sandbox();
    let destination = root.join("archive.txz");

    fetch_from(&server, PostgresVersion::V11, destination.clone())
        .await
        .expect("fetch archive");

    assert!(destination.is_file());
}

#[tokio::test]
async fn maven_fetch_rejects_checksum_mismatch() {
    let txz = fake_distribution_bytes().expect("txz bytes");
    let server = MockServer::start().await;
    publish(
        &server,
        jar_path("10.16.0"),
        fake_jar_bytes(&txz).expect("jar"),
    )
    .await;
    publish(
        &server,
        format!("{}.sha256", jar_path("10.16.0")),
        b"0000000000000000000000000000000000000000000000000000000000000000".to_vec(),
    )
    .await;
    let (_temp, root) = sandbox();
    let destination = root.join("archive.txz");

    let err = fetch_from(&server, PostgresVersion::V10, destination.clone())
        .await
        .expect_err("mismatched checksum");

    assert!(err.to_string().contains("checksums do not match"), "{err}");
    assert!(!destination.exists());
}

#[tokio::test]
async fn maven_fetch_reports_missing_version() {
    let server = MockServer::start().await;
    let (_temp, root) = sandbox();

    let err = fetch_from(
        &server,
        PostgresVersion::new("99.0.0"),
        root.join("archive.txz"),
    )
    .await
    .expect_err("unknown version");

    let message = err.to_string();
    assert!(message.contains("no PostgreSQL 99.0.0 binaries found"), "{message}");
    assert!(message.contains("404"), "{message}");
}

#[test]
fn maven_fetch_reports_unreachable_repository() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    drop(listener);
    let (_temp, root) = sandbox();

    let err = strategy_for(&base)
        .fetch(&PostgresVersion::V13, &root.join("archive.txz"))
        .expect_err("connection refused");

    assert!(err.to_string().contains("unable to connect"), "{err}");
}
