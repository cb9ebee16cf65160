//! Working-directory resolution for configured paths.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::eyre;

use crate::error::{ConfigError, ConfigResult};

/// A configured path, resolved when the setter ran.
///
/// Resolution failures are recorded instead of raised so the builder stays
/// infallible; the pipeline surfaces them before doing any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSetting {
    Resolved(Utf8PathBuf),
    Unresolvable {
        requested: Utf8PathBuf,
        reason: String,
    },
}

impl PathSetting {
    /// Joins relative paths onto the current working directory.
    pub(crate) fn resolve(path: Utf8PathBuf) -> Self {
        if path.is_absolute() {
            return Self::Resolved(path);
        }
        match current_dir() {
            Ok(cwd) => Self::Resolved(cwd.join(path)),
            Err(reason) => Self::Unresolvable {
                requested: path,
                reason,
            },
        }
    }

    pub(crate) fn as_resolved(&self) -> Option<&Utf8Path> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Unresolvable { .. } => None,
        }
    }

    pub(crate) fn check(&self, label: &str) -> ConfigResult<&Utf8Path> {
        match self {
            Self::Resolved(path) => Ok(path),
            Self::Unresolvable { requested, reason } => Err(ConfigError::from(eyre!(
                "failed to resolve {label} path {requested}: {reason}"
            ))),
        }
    }
}

fn current_dir() -> Result<Utf8PathBuf, String> {
    let cwd = std::env::current_dir().map_err(|err| err.to_string())?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|raw| format!("working directory {} is not valid UTF-8", raw.display()))
}
