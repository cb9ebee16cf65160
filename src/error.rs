//! Domain error types for `PostgreSQL` artefact acquisition.

use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return a [`PgEmbedError`].
pub type Result<T> = std::result::Result<T, PgEmbedError>;

/// Result alias for the acquisition pipeline.
pub type AcquisitionResult<T> = std::result::Result<T, AcquisitionError>;

/// Result alias for remote fetch strategies.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result alias for archive unpackers.
pub type UnpackResult<T> = std::result::Result<T, UnpackError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum PgEmbedError {
    /// Indicates the acquisition pipeline failed.
    #[error("acquisition failed")]
    Acquisition(#[from] AcquisitionError),
    /// Indicates configuration parsing failed.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Categorises acquisition failures so callers can branch on structured errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AcquisitionErrorKind {
    /// The requested version is not in the supported table. Not retryable.
    UnsupportedVersion,
    /// The remote fetch strategy failed; retrying `ensure` may succeed.
    FetchFailed,
    /// The archive could not be unpacked into the runtime directory.
    ExtractionFailed,
    /// A relative runtime or data path could not be resolved.
    PathResolutionFailed,
}

/// Captures acquisition failures together with a diagnostic report.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct AcquisitionError {
    kind: AcquisitionErrorKind,
    #[source]
    report: Report,
}

impl AcquisitionError {
    /// Constructs a new acquisition error with the provided kind and
    /// diagnostic report.
    #[must_use]
    pub const fn new(kind: AcquisitionErrorKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Returns the semantic category for this failure.
    #[must_use]
    pub const fn kind(&self) -> AcquisitionErrorKind {
        self.kind
    }

    /// Borrows the underlying diagnostic report.
    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    /// Extracts the underlying diagnostic report.
    #[must_use]
    pub fn into_report(self) -> Report {
        self.report
    }
}

impl From<ConfigError> for AcquisitionError {
    fn from(err: ConfigError) -> Self {
        let ConfigError(report) = err;
        Self::new(AcquisitionErrorKind::PathResolutionFailed, report)
    }
}

impl From<PgEmbedError> for AcquisitionError {
    fn from(err: PgEmbedError) -> Self {
        match err {
            PgEmbedError::Acquisition(inner) => inner,
            PgEmbedError::Config(inner) => inner.into(),
        }
    }
}

/// Captures remote fetch failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct FetchError(#[from] Report);

/// Captures archive extraction failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct UnpackError(#[from] Report);

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);
