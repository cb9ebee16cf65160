//! Turns a [`RuntimeConfig`] into an unpacked runtime directory.
//!
//! The pipeline validates the requested release, consults the archive cache,
//! downloads on a miss, and unpacks into the runtime directory unless a
//! previous run already did. A second call with the same configuration does
//! no network or extraction work.

#[cfg(feature = "async-api")]
mod async_api;
mod marker;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::Report;
use color_eyre::eyre::{WrapErr, eyre};
use secrecy::SecretString;
use tracing::{debug, info, info_span};

use crate::cache::CacheLock;
use crate::config::{OutputSink, RuntimeConfig};
use crate::error::{AcquisitionError, AcquisitionErrorKind, AcquisitionResult};
use crate::observability::{CACHE_LOG_TARGET, LOG_TARGET};
use crate::version::PostgresVersion;

#[cfg(feature = "async-api")]
pub use async_api::{ensure_async, prepare_async};
pub use marker::{RUNTIME_MARKER, installed_version};

/// Everything the process-lifecycle component needs to run the engine.
#[derive(Debug, Clone)]
pub struct PreparedRuntime {
    /// Directory holding the unpacked distribution.
    pub runtime_dir: Utf8PathBuf,
    /// Directory for the cluster's data files; equals `runtime_dir` unless a
    /// data path was configured.
    pub data_dir: Utf8PathBuf,
    /// Release unpacked into `runtime_dir`.
    pub version: PostgresVersion,
    /// Listening port.
    pub port: u16,
    /// Database to create.
    pub database: String,
    /// Superuser name.
    pub username: String,
    /// Superuser password.
    pub password: SecretString,
    /// Locale for `initdb`.
    pub locale: Option<String>,
    /// How long startup may take.
    pub start_timeout: std::time::Duration,
    /// Sink receiving engine output.
    pub output: OutputSink,
}

/// Orchestrates cache lookup, download, and extraction for one configuration.
///
/// The pipeline only reads the configuration. Concurrent pipelines may share
/// a cache root but must not share a runtime directory.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionPipeline<'cfg> {
    config: &'cfg RuntimeConfig,
}

impl<'cfg> AcquisitionPipeline<'cfg> {
    /// Wraps `config` without performing any work.
    #[must_use]
    pub const fn new(config: &'cfg RuntimeConfig) -> Self {
        Self { config }
    }

    /// Ensures the runtime directory holds the requested release and returns
    /// its path.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionErrorKind::UnsupportedVersion`] or
    /// [`AcquisitionErrorKind::PathResolutionFailed`] before any I/O,
    /// [`AcquisitionErrorKind::FetchFailed`] when the archive cannot be
    /// downloaded, and [`AcquisitionErrorKind::ExtractionFailed`] when it
    /// cannot be unpacked.
    pub fn ensure(&self) -> AcquisitionResult<Utf8PathBuf> {
        let version = self.config.version();
        let span = info_span!(target: LOG_TARGET, "ensure_runtime", %version);
        let _entered = span.enter();

        self.validate()?;
        let archive = self.ensure_archive()?;
        let runtime_dir = self.config.effective_runtime_dir()?;
        self.ensure_unpacked(&archive, &runtime_dir)?;

        info!(target: LOG_TARGET, runtime_dir = %runtime_dir, "runtime directory ready");
        Ok(runtime_dir)
    }

    /// Runs [`Self::ensure`] and assembles the hand-off record.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::ensure`].
    pub fn prepare(&self) -> AcquisitionResult<PreparedRuntime> {
        let runtime_dir = self.ensure()?;
        let data_dir = self.config.effective_data_dir(&runtime_dir)?;
        Ok(PreparedRuntime {
            runtime_dir,
            data_dir,
            version: self.config.version().clone(),
            port: self.config.port(),
            database: self.config.database().to_owned(),
            username: self.config.username().to_owned(),
            password: self.config.password().clone(),
            locale: self.config.locale().map(str::to_owned),
            start_timeout: self.config.start_timeout(),
            output: self.config.output().clone(),
        })
    }

    fn validate(&self) -> AcquisitionResult<()> {
        let version = self.config.version();
        let supported = self.config.supported_versions();
        if !supported.contains(version) {
            let listed = supported
                .iter()
                .map(PostgresVersion::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AcquisitionError::new(
                AcquisitionErrorKind::UnsupportedVersion,
                eyre!("unsupported PostgreSQL version {version} (supported: {listed})"),
            ));
        }
        self.config.check_paths()?;
        Ok(())
    }

    fn ensure_archive(&self) -> AcquisitionResult<Utf8PathBuf> {
        let version = self.config.version();
        let archive = self.config.cache_locator().locate(version);
        if archive.is_file() {
            debug!(target: CACHE_LOG_TARGET, path = %archive, "archive cache hit");
            return Ok(archive);
        }

        debug!(target: CACHE_LOG_TARGET, path = %archive, "archive cache miss");
        let _lock = CacheLock::acquire_exclusive(&archive)
            .wrap_err_with(|| format!("failed to lock cache entry {archive}"))
            .map_err(|report| fetch_failed(version, &archive, report))?;

        if archive.is_file() {
            debug!(
                target: CACHE_LOG_TARGET,
                path = %archive,
                "archive cached by another process"
            );
            return Ok(archive);
        }

        self.config
            .remote_fetch_strategy()
            .fetch(version, &archive)
            .map_err(|err| fetch_failed(version, &archive, Report::new(err)))?;

        if !archive.is_file() {
            return Err(fetch_failed(
                version,
                &archive,
                eyre!("fetch strategy reported success but {archive} does not exist"),
            ));
        }
        info!(target: CACHE_LOG_TARGET, path = %archive, "archive fetched into cache");
        Ok(archive)
    }

    fn ensure_unpacked(&self, archive: &Utf8Path, runtime_dir: &Utf8Path) -> AcquisitionResult<()> {
        let version = self.config.version();
        if marker::is_usable(runtime_dir, version) {
            debug!(
                target: LOG_TARGET,
                runtime_dir = %runtime_dir,
                "runtime directory already unpacked"
            );
            return Ok(());
        }

        marker::clear(runtime_dir)
            .map_err(|report| extraction_failed(archive, runtime_dir, report))?;
        self.config
            .unpacker()
            .unpack(archive, runtime_dir)
            .map_err(|err| extraction_failed(archive, runtime_dir, Report::new(err)))?;
        marker::write(runtime_dir, version, archive)
            .map_err(|report| extraction_failed(archive, runtime_dir, report))?;
        info!(
            target: LOG_TARGET,
            source = %archive,
            destination = %runtime_dir,
            "archive unpacked"
        );
        Ok(())
    }
}

fn fetch_failed(version: &PostgresVersion, archive: &Utf8Path, report: Report) -> AcquisitionError {
    AcquisitionError::new(
        AcquisitionErrorKind::FetchFailed,
        report.wrap_err(format!("failed to fetch PostgreSQL {version} into {archive}")),
    )
}

fn extraction_failed(
    archive: &Utf8Path,
    runtime_dir: &Utf8Path,
    report: Report,
) -> AcquisitionError {
    AcquisitionError::new(
        AcquisitionErrorKind::ExtractionFailed,
        report.wrap_err(format!("failed to unpack {archive} into {runtime_dir}")),
    )
}

/// Ensures the runtime directory for `config` and returns its path.
///
/// # Examples
/// ```no_run
/// use pg_embed_runtime::{PostgresVersion, RuntimeConfig, ensure};
///
/// let config = RuntimeConfig::default()
///     .with_version(PostgresVersion::V12)
///     .with_runtime_path("target/pg-runtime");
/// let runtime_dir = ensure(&config)?;
/// assert!(runtime_dir.join("bin").is_dir());
/// # Ok::<(), pg_embed_runtime::AcquisitionError>(())
/// ```
///
/// # Errors
///
/// See [`AcquisitionPipeline::ensure`].
pub fn ensure(config: &RuntimeConfig) -> AcquisitionResult<Utf8PathBuf> {
    AcquisitionPipeline::new(config).ensure()
}

/// Ensures the runtime directory for `config` and returns the hand-off record.
///
/// # Errors
///
/// See [`AcquisitionPipeline::ensure`].
pub fn prepare(config: &RuntimeConfig) -> AcquisitionResult<PreparedRuntime> {
    AcquisitionPipeline::new(config).prepare()
}
