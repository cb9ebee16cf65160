//! `PostgreSQL` release identifiers and the table of supported releases.
//!
//! A [`PostgresVersion`] is an opaque token; whether it can be acquired is
//! decided by membership in a [`SupportedVersions`] table. The table is plain
//! data so new releases can be added without touching the pipeline.

use std::borrow::Cow;
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

/// Releases bundled with the crate, newest first.
const BUILTIN_RELEASES: &[&str] = &["13.2.0", "12.6.0", "11.11.0", "10.16.0", "9.6.21"];

/// Semantic-version string identifying a `PostgreSQL` distribution.
///
/// Construction never validates; the acquisition pipeline checks the value
/// against the configured [`SupportedVersions`] before doing any I/O.
///
/// # Examples
/// ```
/// use pg_embed_runtime::PostgresVersion;
///
/// let version = PostgresVersion::new("12.6.0");
/// assert_eq!(version.as_str(), "12.6.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostgresVersion(Cow<'static, str>);

impl PostgresVersion {
    /// `PostgreSQL` 13.2.0.
    pub const V13: Self = Self(Cow::Borrowed("13.2.0"));
    /// `PostgreSQL` 12.6.0.
    pub const V12: Self = Self(Cow::Borrowed("12.6.0"));
    /// `PostgreSQL` 11.11.0.
    pub const V11: Self = Self(Cow::Borrowed("11.11.0"));
    /// `PostgreSQL` 10.16.0.
    pub const V10: Self = Self(Cow::Borrowed("10.16.0"));
    /// `PostgreSQL` 9.6.21.
    pub const V9: Self = Self(Cow::Borrowed("9.6.21"));

    /// Wraps an arbitrary version string.
    #[must_use]
    pub fn new(version: impl Into<Cow<'static, str>>) -> Self {
        Self(version.into())
    }

    /// Returns the version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn semver(&self) -> Option<Version> {
        Version::parse(self.as_str()).ok()
    }
}

impl Default for PostgresVersion {
    fn default() -> Self {
        SupportedVersions::builtin().latest().unwrap_or(Self::V13)
    }
}

impl fmt::Display for PostgresVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for PostgresVersion {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PostgresVersion {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Closed set of releases the pipeline is willing to acquire.
///
/// # Examples
/// ```
/// use pg_embed_runtime::{PostgresVersion, SupportedVersions};
///
/// let table = SupportedVersions::builtin().with_release(PostgresVersion::new("14.1.0"));
/// assert!(table.contains(&PostgresVersion::new("14.1.0")));
/// assert_eq!(table.latest(), Some(PostgresVersion::new("14.1.0")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    releases: Vec<PostgresVersion>,
}

impl SupportedVersions {
    /// Returns the releases bundled with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            releases: BUILTIN_RELEASES
                .iter()
                .map(|release| PostgresVersion::new(*release))
                .collect(),
        }
    }

    /// Builds a table from an explicit list of releases.
    #[must_use]
    pub fn from_releases(releases: impl IntoIterator<Item = PostgresVersion>) -> Self {
        let mut table = Self {
            releases: Vec::new(),
        };
        for release in releases {
            table.push(release);
        }
        table
    }

    /// Returns a copy of the table that also accepts `release`.
    #[must_use]
    pub fn with_release(mut self, release: PostgresVersion) -> Self {
        self.push(release);
        self
    }

    fn push(&mut self, release: PostgresVersion) {
        if !self.releases.contains(&release) {
            self.releases.push(release);
        }
    }

    /// Reports whether `version` may be acquired.
    #[must_use]
    pub fn contains(&self, version: &PostgresVersion) -> bool {
        self.releases.contains(version)
    }

    /// Returns the newest release, ordering by semantic version.
    ///
    /// Entries that do not parse as semantic versions never win.
    #[must_use]
    pub fn latest(&self) -> Option<PostgresVersion> {
        self.releases
            .iter()
            .filter_map(|release| release.semver().map(|parsed| (parsed, release)))
            .max_by(|(left, _), (right, _)| left.cmp(right))
            .map(|(_, release)| release.clone())
    }

    /// Iterates over the supported releases in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PostgresVersion> {
        self.releases.iter()
    }

    /// Number of supported releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Reports whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self::builtin()
    }
}
