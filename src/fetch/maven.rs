//! Fetches archives from a Maven repository hosting zonky's
//! embedded-postgres-binaries artefacts.
//!
//! Each release is published as a `.jar` (a zip) wrapping a single `.txz`
//! archive, optionally accompanied by a `.sha256` checksum file.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::time::Duration;

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result, bail, eyre};
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span};
use zip::ZipArchive;

use super::{RemoteFetchStrategy, write_archive_atomically};
use crate::error::FetchResult;
use crate::observability::FETCH_LOG_TARGET;
use crate::platform::Platform;
use crate::version::PostgresVersion;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default remote fetch strategy backed by Maven Central.
///
/// # Examples
/// ```
/// use pg_embed_runtime::{MavenFetchStrategy, Platform, PostgresVersion};
///
/// let strategy = MavenFetchStrategy::new()
///     .with_repository_url("https://mirror.example/maven2/")
///     .with_platform(Platform::new("linux", "amd64"));
/// assert_eq!(
///     strategy.jar_url(&PostgresVersion::V12),
///     "https://mirror.example/maven2/io/zonky/test/postgres/\
///      embedded-postgres-binaries-linux-amd64/12.6.0/\
///      embedded-postgres-binaries-linux-amd64-12.6.0.jar"
/// );
/// ```
#[derive(Clone)]
pub struct MavenFetchStrategy {
    repository_url: String,
    platform: Platform,
    agent: ureq::Agent,
}

impl MavenFetchStrategy {
    /// Maven Central base URL.
    pub const DEFAULT_REPOSITORY_URL: &'static str = "https://repo1.maven.org/maven2";

    /// Targets Maven Central for the host platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository_url: Self::DEFAULT_REPOSITORY_URL.to_owned(),
            platform: Platform::current(),
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .build(),
        }
    }

    /// Points the strategy at a different repository, e.g. an internal mirror.
    #[must_use]
    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        let raw: String = url.into();
        self.repository_url = raw.trim_end_matches('/').to_owned();
        self
    }

    /// Overrides the platform qualifiers used to build the artefact URL.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the HTTP agent, e.g. to configure proxies or TLS.
    #[must_use]
    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = agent;
        self
    }

    /// Repository base URL without a trailing slash.
    #[must_use]
    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    /// Returns the URL of the `.jar` published for `version`.
    #[must_use]
    pub fn jar_url(&self, version: &PostgresVersion) -> String {
        let artefact = format!(
            "embedded-postgres-binaries-{}-{}",
            self.platform.os(),
            self.platform.arch()
        );
        format!(
            "{}/io/zonky/test/postgres/{artefact}/{version}/{artefact}-{version}.jar",
            self.repository_url
        )
    }

    fn download_jar(&self, version: &PostgresVersion, url: &str) -> Result<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                bail!("no PostgreSQL {version} binaries found at {url} (HTTP {code})")
            }
            Err(err) => {
                return Err(eyre!("unable to connect to {}: {err}", self.repository_url));
            }
        };

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .with_context(|| format!("read response body from {url}"))?;
        debug!(target: FETCH_LOG_TARGET, url, bytes = body.len(), "downloaded jar");
        Ok(body)
    }

    /// Compares the jar against its published checksum, if there is one.
    fn verify_checksum(&self, url: &str, jar: &[u8]) -> Result<()> {
        let checksum_url = format!("{url}.sha256");
        let Ok(response) = self.agent.get(&checksum_url).call() else {
            debug!(
                target: FETCH_LOG_TARGET,
                url = %checksum_url,
                "no checksum published, skipping verification"
            );
            return Ok(());
        };

        let published = response
            .into_string()
            .with_context(|| format!("read checksum from {checksum_url}"))?;
        let expected = published
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let actual = hex_digest(jar);
        if expected != actual {
            bail!("downloaded checksums do not match: expected {expected}, computed {actual}");
        }
        debug!(target: FETCH_LOG_TARGET, url, "checksum verified");
        Ok(())
    }
}

impl Default for MavenFetchStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MavenFetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MavenFetchStrategy")
            .field("repository_url", &self.repository_url)
            .field("platform", &self.platform.to_string())
            .finish_non_exhaustive()
    }
}

impl RemoteFetchStrategy for MavenFetchStrategy {
    fn fetch(&self, version: &PostgresVersion, destination: &Utf8Path) -> FetchResult<()> {
        let url = self.jar_url(version);
        let span = info_span!(target: FETCH_LOG_TARGET, "fetch_archive", %version, %url);
        let _entered = span.enter();

        info!(
            target: FETCH_LOG_TARGET,
            destination = %destination,
            "downloading PostgreSQL binaries"
        );
        let jar = self.download_jar(version, &url)?;
        self.verify_checksum(&url, &jar)?;
        write_archive_atomically(destination, |file| copy_txz_entry(&jar, &url, file))?;
        info!(target: FETCH_LOG_TARGET, destination = %destination, "archive cached");
        Ok(())
    }
}

pub(super) fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Streams the first `.txz` entry of the jar into `out`.
pub(super) fn copy_txz_entry(jar: &[u8], url: &str, out: &mut File) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(jar))
        .with_context(|| format!("open jar retrieved from {url}"))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("read jar entry {index} from {url}"))?;
        if entry.is_file() && entry.name().ends_with(".txz") {
            io::copy(&mut entry, out)
                .with_context(|| format!("extract {} from {url}", entry.name()))?;
            return Ok(());
        }
    }
    Err(eyre!("cannot find binary in archive retrieved from {url}"))
}
