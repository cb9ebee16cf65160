//! Acquires the `PostgreSQL` distribution an embedded server runs from.
//!
//! Given a [`RuntimeConfig`], the crate makes sure the requested release is
//! cached locally, downloading it from a Maven repository on a miss, and that
//! it has been unpacked into the runtime directory. Caching is keyed on the
//! version alone, so instances that differ only in port or credentials share
//! one download. Starting and stopping the server is left to the caller,
//! which receives everything it needs in a [`PreparedRuntime`].
//!
//! ```no_run
//! use pg_embed_runtime::{PostgresVersion, RuntimeConfig, prepare};
//!
//! let config = RuntimeConfig::default()
//!     .with_version(PostgresVersion::V12)
//!     .with_port(15432);
//! let prepared = prepare(&config)?;
//! println!("binaries in {}", prepared.runtime_dir.join("bin"));
//! # Ok::<(), pg_embed_runtime::AcquisitionError>(())
//! ```

mod cache;
mod config;
mod error;
mod fetch;
mod fs;
mod observability;
mod pipeline;
mod platform;
#[doc(hidden)]
pub mod test_support;
mod unpack;
mod version;

pub use cache::{
    CACHE_DIR_ENV, CacheLocator, CacheLock, DefaultCacheLocator, archive_file_name,
    resolve_cache_root,
};
pub use config::{
    DEFAULT_CREDENTIAL, DEFAULT_PORT, DEFAULT_START_TIMEOUT, OutputSink, RuntimeConfig,
    RuntimeEnvCfg,
};
pub use error::{
    AcquisitionError, AcquisitionErrorKind, AcquisitionResult, ConfigError, ConfigResult,
    FetchError, FetchResult, PgEmbedError, Result, UnpackError, UnpackResult,
};
pub use fetch::{MavenFetchStrategy, RemoteFetchStrategy, write_archive_atomically};
#[cfg(feature = "async-api")]
pub use pipeline::{ensure_async, prepare_async};
pub use pipeline::{
    AcquisitionPipeline, PreparedRuntime, RUNTIME_MARKER, ensure, installed_version, prepare,
};
pub use platform::Platform;
pub use unpack::{ArchiveUnpacker, TarXzUnpacker};
pub use version::{PostgresVersion, SupportedVersions};

use color_eyre::eyre::Context;

/// Loads `PG_*` settings from the environment and prepares the runtime.
///
/// This is the entry point used by the `pg_embed_fetch` binary.
///
/// # Errors
///
/// Returns [`PgEmbedError::Config`] when the environment cannot be parsed and
/// [`PgEmbedError::Acquisition`] when the pipeline fails.
pub fn run() -> Result<PreparedRuntime> {
    if let Err(err) = color_eyre::install() {
        tracing::debug!("color_eyre already installed: {err}");
    }

    let cfg = RuntimeEnvCfg::load()
        .context("failed to load configuration via OrthoConfig")
        .map_err(ConfigError::from)?;
    let config = cfg.to_runtime_config();
    Ok(prepare(&config)?)
}
