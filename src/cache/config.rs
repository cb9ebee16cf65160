//! Resolution of the shared archive cache root.
//!
//! Resolves the cache directory from environment variables with XDG-compliant
//! fallback paths.

use camino::Utf8PathBuf;
use std::path::PathBuf;

/// Subdirectory path within the XDG cache home.
pub(crate) const CACHE_SUBDIR: &str = "pg-embed/archives";

/// Environment variable that overrides the cache root.
pub const CACHE_DIR_ENV: &str = "PG_BINARY_CACHE_DIR";

/// Resolves the archive cache root from environment and XDG conventions.
///
/// The resolution order is:
///
/// 1. `PG_BINARY_CACHE_DIR` environment variable if set and valid UTF-8
/// 2. `$XDG_CACHE_HOME/pg-embed/archives` if `XDG_CACHE_HOME` is set
/// 3. `~/.cache/pg-embed/archives` as fallback
/// 4. `<temp dir>/pg-embed/archives` as last resort
///
/// # Examples
///
/// ```
/// use pg_embed_runtime::resolve_cache_root;
///
/// let cache_root = resolve_cache_root();
/// assert!(!cache_root.as_str().is_empty());
/// ```
#[must_use]
pub fn resolve_cache_root() -> Utf8PathBuf {
    resolve_from_env()
        .or_else(resolve_from_xdg_cache)
        .or_else(resolve_from_home)
        .unwrap_or_else(resolve_from_temp)
}

fn non_blank_env(key: &str) -> Option<Utf8PathBuf> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Utf8PathBuf::from_path_buf(PathBuf::from(trimmed)).ok()
}

fn resolve_from_env() -> Option<Utf8PathBuf> {
    non_blank_env(CACHE_DIR_ENV)
}

fn resolve_from_xdg_cache() -> Option<Utf8PathBuf> {
    non_blank_env("XDG_CACHE_HOME").map(|path| path.join(CACHE_SUBDIR))
}

fn resolve_from_home() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    let path = Utf8PathBuf::from_path_buf(home).ok()?;
    Some(path.join(".cache").join(CACHE_SUBDIR))
}

fn resolve_from_temp() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
        .join(CACHE_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_env::with_vars;

    #[test]
    fn resolve_cache_root_respects_explicit_env_var() {
        let expected = "/custom/cache/path";
        let result = with_vars(
            [
                (CACHE_DIR_ENV, Some(expected)),
                ("XDG_CACHE_HOME", None::<&str>),
            ],
            resolve_cache_root,
        );
        assert_eq!(result.as_str(), expected);
    }

    #[test]
    fn resolve_cache_root_uses_xdg_cache_home_when_env_var_unset() {
        let xdg_cache = "/home/testuser/.cache";
        let result = with_vars(
            [
                (CACHE_DIR_ENV, None::<&str>),
                ("XDG_CACHE_HOME", Some(xdg_cache)),
            ],
            resolve_cache_root,
        );
        assert_eq!(result.as_str(), format!("{xdg_cache}/{CACHE_SUBDIR}"));
    }

    #[test]
    fn resolve_cache_root_ignores_whitespace_only_env_var() {
        let xdg_cache = "/home/testuser/.cache";
        let result = with_vars(
            [
                (CACHE_DIR_ENV, Some("   ")),
                ("XDG_CACHE_HOME", Some(xdg_cache)),
            ],
            resolve_cache_root,
        );
        assert_eq!(result.as_str(), format!("{xdg_cache}/{CACHE_SUBDIR}"));
    }

    #[test]
    fn resolve_cache_root_falls_back_to_home_cache() {
        let result = with_vars(
            [
                (CACHE_DIR_ENV, None::<&str>),
                ("XDG_CACHE_HOME", None::<&str>),
            ],
            resolve_cache_root,
        );
        assert!(result.as_str().ends_with(CACHE_SUBDIR));
    }
}
