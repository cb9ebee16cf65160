//! Async entry points that keep blocking I/O off the executor threads.

use camino::Utf8PathBuf;
use tokio::task::{JoinError, spawn_blocking};

use super::{PreparedRuntime, ensure, prepare};
use crate::config::RuntimeConfig;
use crate::error::AcquisitionResult;

/// Runs [`ensure`] on Tokio's blocking thread pool.
///
/// # Examples
/// ```no_run
/// use pg_embed_runtime::{RuntimeConfig, ensure_async};
///
/// # async fn demo() -> Result<(), pg_embed_runtime::AcquisitionError> {
/// let runtime_dir = ensure_async(RuntimeConfig::default()).await?;
/// assert!(runtime_dir.join("bin").is_dir());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the same errors as [`ensure`].
///
/// # Panics
///
/// Resumes any panic raised by the pipeline, and panics if the runtime shuts
/// down before the blocking task completes.
pub async fn ensure_async(config: RuntimeConfig) -> AcquisitionResult<Utf8PathBuf> {
    spawn_blocking(move || ensure(&config))
        .await
        .unwrap_or_else(resume)
}

/// Runs [`prepare`] on Tokio's blocking thread pool.
///
/// # Errors
///
/// Returns the same errors as [`prepare`].
///
/// # Panics
///
/// Resumes any panic raised by the pipeline, and panics if the runtime shuts
/// down before the blocking task completes.
pub async fn prepare_async(config: RuntimeConfig) -> AcquisitionResult<PreparedRuntime> {
    spawn_blocking(move || prepare(&config))
        .await
        .unwrap_or_else(resume)
}

fn resume<T>(err: JoinError) -> T {
    std::panic::resume_unwind(err.into_panic())
}
