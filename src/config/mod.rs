//! Immutable runtime configuration for an embedded `PostgreSQL` instance.
//!
//! Every `with_*` transformer consumes the configuration and returns a new
//! value with exactly one field changed, so a base configuration can be cloned
//! and specialised per instance without affecting other holders.

mod env;
mod path;
mod sink;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::eyre;
use secrecy::SecretString;

use crate::cache::{CacheLocator, DefaultCacheLocator};
use crate::error::{ConfigError, ConfigResult};
use crate::fetch::{MavenFetchStrategy, RemoteFetchStrategy};
use crate::unpack::{ArchiveUnpacker, TarXzUnpacker};
use crate::version::{PostgresVersion, SupportedVersions};

pub use env::RuntimeEnvCfg;
pub(crate) use path::PathSetting;
pub use sink::OutputSink;

/// Port `PostgreSQL` listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5432;

/// Name used for the default database, superuser, and password.
pub const DEFAULT_CREDENTIAL: &str = "postgres";

/// Start timeout handed to the process-lifecycle component by default.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(15);

/// Directory below the system temp dir holding per-process runtimes.
const EPHEMERAL_RUNTIME_SUBDIR: &str = "pg-embed";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Declarative description of the instance to provision.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use pg_embed_runtime::{PostgresVersion, RuntimeConfig};
///
/// let base = RuntimeConfig::default().with_version(PostgresVersion::V12);
/// let primary = base.clone().with_port(5433);
/// let replica = base.clone().with_port(5434).with_start_timeout(Duration::from_secs(30));
///
/// assert_eq!(base.port(), 5432);
/// assert_eq!(primary.port(), 5433);
/// assert_eq!(replica.version(), &PostgresVersion::V12);
/// ```
#[derive(Clone)]
pub struct RuntimeConfig {
    version: PostgresVersion,
    port: u16,
    database: String,
    username: String,
    password: SecretString,
    runtime_path: Option<PathSetting>,
    data_path: Option<PathSetting>,
    locale: Option<String>,
    start_timeout: Duration,
    output: OutputSink,
    supported_versions: SupportedVersions,
    cache_locator: Option<Arc<dyn CacheLocator>>,
    remote_fetch_strategy: Option<Arc<dyn RemoteFetchStrategy>>,
    unpacker: Option<Arc<dyn ArchiveUnpacker>>,
    instance: u64,
}

impl RuntimeConfig {
    /// Returns a configuration populated entirely with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: PostgresVersion::default(),
            port: DEFAULT_PORT,
            database: DEFAULT_CREDENTIAL.to_owned(),
            username: DEFAULT_CREDENTIAL.to_owned(),
            password: SecretString::from(DEFAULT_CREDENTIAL),
            runtime_path: None,
            data_path: None,
            locale: None,
            start_timeout: DEFAULT_START_TIMEOUT,
            output: OutputSink::stdout(),
            supported_versions: SupportedVersions::builtin(),
            cache_locator: None,
            remote_fetch_strategy: None,
            unpacker: None,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Sets the `PostgreSQL` release to acquire.
    ///
    /// The value is checked against [`Self::supported_versions`] by the
    /// pipeline, not here.
    #[must_use]
    pub fn with_version(mut self, version: PostgresVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the port the engine will listen on.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the name of the database created for the caller.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the superuser name.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the superuser password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = SecretString::from(password.into());
        self
    }

    /// Sets the directory the distribution is unpacked into.
    ///
    /// Relative paths are resolved against the working directory now, not
    /// when the pipeline runs. Without a data path this directory doubles as
    /// the data directory.
    #[must_use]
    pub fn with_runtime_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.runtime_path = Some(PathSetting::resolve(path.into()));
        self
    }

    /// Sets the directory holding the cluster's data files.
    ///
    /// Relative paths are resolved against the working directory now. A data
    /// directory initialised by an earlier run is left for reuse.
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.data_path = Some(PathSetting::resolve(path.into()));
        self
    }

    /// Sets the locale passed to `initdb`.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets how long the lifecycle component may wait for startup.
    #[must_use]
    pub const fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Sets the sink receiving engine output.
    #[must_use]
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    /// Replaces the table of releases the pipeline accepts.
    #[must_use]
    pub fn with_supported_versions(mut self, supported: SupportedVersions) -> Self {
        self.supported_versions = supported;
        self
    }

    /// Overrides where cached archives are looked up.
    #[must_use]
    pub fn with_cache_locator(mut self, locator: impl CacheLocator + 'static) -> Self {
        self.cache_locator = Some(Arc::new(locator));
        self
    }

    /// Overrides how missing archives are downloaded.
    #[must_use]
    pub fn with_remote_fetch_strategy(
        mut self,
        strategy: impl RemoteFetchStrategy + 'static,
    ) -> Self {
        self.remote_fetch_strategy = Some(Arc::new(strategy));
        self
    }

    /// Overrides how archives are extracted.
    #[must_use]
    pub fn with_unpacker(mut self, unpacker: impl ArchiveUnpacker + 'static) -> Self {
        self.unpacker = Some(Arc::new(unpacker));
        self
    }

    /// Requested release.
    #[must_use]
    pub const fn version(&self) -> &PostgresVersion {
        &self.version
    }

    /// Listening port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Superuser name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Superuser password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    /// Resolved runtime path, if one was set and resolved.
    #[must_use]
    pub fn runtime_path(&self) -> Option<&Utf8Path> {
        self.runtime_path.as_ref().and_then(PathSetting::as_resolved)
    }

    /// Resolved data path, if one was set and resolved.
    #[must_use]
    pub fn data_path(&self) -> Option<&Utf8Path> {
        self.data_path.as_ref().and_then(PathSetting::as_resolved)
    }

    /// Locale for `initdb`.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Startup timeout for the lifecycle component.
    #[must_use]
    pub const fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    /// Sink receiving engine output.
    #[must_use]
    pub const fn output(&self) -> &OutputSink {
        &self.output
    }

    /// Releases the pipeline accepts.
    #[must_use]
    pub const fn supported_versions(&self) -> &SupportedVersions {
        &self.supported_versions
    }

    /// Configured cache locator, or the default one.
    #[must_use]
    pub fn cache_locator(&self) -> Arc<dyn CacheLocator> {
        self.cache_locator
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultCacheLocator::new()))
    }

    /// Configured fetch strategy, or the default one.
    #[must_use]
    pub fn remote_fetch_strategy(&self) -> Arc<dyn RemoteFetchStrategy> {
        self.remote_fetch_strategy
            .clone()
            .unwrap_or_else(|| Arc::new(MavenFetchStrategy::new()))
    }

    /// Configured unpacker, or the default one.
    #[must_use]
    pub fn unpacker(&self) -> Arc<dyn ArchiveUnpacker> {
        self.unpacker
            .clone()
            .unwrap_or_else(|| Arc::new(TarXzUnpacker))
    }

    #[cfg(test)]
    pub(crate) fn with_data_setting(mut self, setting: PathSetting) -> Self {
        self.data_path = Some(setting);
        self
    }

    /// Surfaces path resolution failures recorded by the setters.
    pub(crate) fn check_paths(&self) -> ConfigResult<()> {
        if let Some(setting) = &self.runtime_path {
            setting.check("runtime")?;
        }
        if let Some(setting) = &self.data_path {
            setting.check("data")?;
        }
        Ok(())
    }

    /// Runtime directory used by the pipeline.
    ///
    /// Falls back to `<temp>/pg-embed/runtime-<pid>-<instance>-<port>-<version>`.
    /// The instance token is drawn once per [`Self::new`] and survives
    /// clones, so the same configuration always maps to the same directory
    /// while independently built configurations never collide.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured path could not be resolved or the
    /// temp directory is not valid UTF-8.
    pub fn effective_runtime_dir(&self) -> ConfigResult<Utf8PathBuf> {
        if let Some(setting) = &self.runtime_path {
            return setting.check("runtime").map(Utf8Path::to_path_buf);
        }
        let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir()).map_err(|raw| {
            ConfigError::from(eyre!(
                "temp directory {} is not valid UTF-8",
                raw.display()
            ))
        })?;
        Ok(temp.join(EPHEMERAL_RUNTIME_SUBDIR).join(format!(
            "runtime-{}-{}-{}-{}",
            std::process::id(),
            self.instance,
            self.port,
            self.version
        )))
    }

    /// Data directory for a given runtime directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured data path could not be resolved.
    pub fn effective_data_dir(&self, runtime_dir: &Utf8Path) -> ConfigResult<Utf8PathBuf> {
        match &self.data_path {
            Some(setting) => setting.check("data").map(Utf8Path::to_path_buf),
            None => Ok(runtime_dir.to_path_buf()),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("version", &self.version)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("runtime_path", &self.runtime_path)
            .field("data_path", &self.data_path)
            .field("locale", &self.locale)
            .field("start_timeout", &self.start_timeout)
            .field("supported_versions", &self.supported_versions)
            .field("custom_cache_locator", &self.cache_locator.is_some())
            .field("custom_fetch_strategy", &self.remote_fetch_strategy.is_some())
            .field("custom_unpacker", &self.unpacker.is_some())
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
