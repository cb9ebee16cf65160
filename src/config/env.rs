//! Environment-driven configuration layer.

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use super::RuntimeConfig;
use crate::cache::DefaultCacheLocator;
use crate::error::{ConfigError, ConfigResult};
use crate::fetch::MavenFetchStrategy;
use crate::version::PostgresVersion;

/// Captures `PostgreSQL` runtime settings supplied via `PG_*` environment
/// variables.
///
/// # Examples
/// ```
/// use pg_embed_runtime::RuntimeEnvCfg;
///
/// let cfg = RuntimeEnvCfg::default();
/// assert!(cfg.port.is_none());
/// assert_eq!(cfg.to_runtime_config().port(), 5432);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "PG")]
pub struct RuntimeEnvCfg {
    /// Exact release to acquire, e.g. `12.6.0`.
    pub postgres_version: Option<String>,
    /// Port assigned to the embedded `PostgreSQL` server.
    pub port: Option<u16>,
    /// Name of the database created for the caller.
    pub database: Option<String>,
    /// Name of the administrative user created for the cluster.
    pub username: Option<String>,
    /// Password provisioned for the administrative user.
    pub password: Option<String>,
    /// Directory the distribution is unpacked into.
    pub runtime_dir: Option<Utf8PathBuf>,
    /// Directory used for `PostgreSQL` data files when provided.
    pub data_dir: Option<Utf8PathBuf>,
    /// Locale applied to `initdb` when specified.
    pub locale: Option<String>,
    /// Seconds the lifecycle component may wait for startup.
    pub start_timeout_secs: Option<u64>,
    /// Root of the shared archive cache.
    pub binary_cache_dir: Option<Utf8PathBuf>,
    /// Maven repository hosting the binaries.
    pub binary_repository_url: Option<String>,
}

impl RuntimeEnvCfg {
    /// Loads configuration from environment variables without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable cannot be parsed into its field type.
    pub fn load() -> ConfigResult<Self> {
        let args = [OsString::from("pg-embed-runtime")];
        Self::load_from_iter(args).map_err(|err| ConfigError::from(eyre!(err)))
    }

    /// Applies every set field on top of [`RuntimeConfig::default`].
    ///
    /// Relative directories resolve against the current working directory.
    #[must_use]
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config = self.apply_identity(config);
        config = self.apply_paths(config);
        self.apply_acquisition(config)
    }

    fn apply_identity(&self, mut config: RuntimeConfig) -> RuntimeConfig {
        if let Some(ref version) = self.postgres_version {
            config = config.with_version(PostgresVersion::new(version.clone()));
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(ref database) = self.database {
            config = config.with_database(database.clone());
        }
        if let Some(ref username) = self.username {
            config = config.with_username(username.clone());
        }
        if let Some(ref password) = self.password {
            config = config.with_password(password.clone());
        }
        if let Some(ref locale) = self.locale {
            config = config.with_locale(locale.clone());
        }
        if let Some(secs) = self.start_timeout_secs {
            config = config.with_start_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn apply_paths(&self, mut config: RuntimeConfig) -> RuntimeConfig {
        if let Some(ref dir) = self.runtime_dir {
            config = config.with_runtime_path(dir.clone());
        }
        if let Some(ref dir) = self.data_dir {
            config = config.with_data_path(dir.clone());
        }
        config
    }

    fn apply_acquisition(&self, mut config: RuntimeConfig) -> RuntimeConfig {
        if let Some(ref dir) = self.binary_cache_dir {
            config = config.with_cache_locator(DefaultCacheLocator::with_root(dir.clone()));
        }
        if let Some(ref url) = self.binary_repository_url {
            config = config
                .with_remote_fetch_strategy(MavenFetchStrategy::new().with_repository_url(url));
        }
        config
    }
}
