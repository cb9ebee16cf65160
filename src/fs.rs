//! Shared filesystem helpers that operate within the capability sandbox.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use color_eyre::eyre::{Context, Result, eyre};
use std::io::ErrorKind;
use tracing::debug;

use crate::observability::LOG_TARGET;

/// Resolves a path to an ambient directory handle paired with the relative path component.
///
/// Absolute paths are opened relative to the ambient root; relative paths reuse the current
/// working directory.
fn ambient_dir_and_path(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    if path.has_root() {
        let stripped = path
            .strip_prefix("/")
            .map_or_else(|_| path.to_path_buf(), Utf8Path::to_path_buf);
        let dir = Dir::open_ambient_dir("/", ambient_authority())
            .context("open ambient root directory")?;
        Ok((dir, stripped))
    } else {
        let dir = Dir::open_ambient_dir(".", ambient_authority())
            .context("open ambient working directory")?;
        Ok((dir, path.to_path_buf()))
    }
}

/// Ensures the provided path exists, creating intermediate directories when required.
pub(crate) fn ensure_dir_exists(path: &Utf8Path) -> Result<()> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }

    dir.create_dir_all(relative.as_std_path())
        .or_else(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                Ok(())
            } else {
                Err(err)
            }
        })
        .with_context(|| format!("create {}", path.as_str()))?;
    debug!(target: LOG_TARGET, path = %path, "ensured directory exists");
    Ok(())
}

/// Ensures the parent directory of `path` exists and returns it.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> Result<&Utf8Path> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .ok_or_else(|| eyre!("{path} has no parent directory"))?;
    ensure_dir_exists(parent)?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dir_exists_creates_nested_directories() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let nested = root.join("a/b/c");

        ensure_dir_exists(&nested).expect("create nested");
        assert!(nested.is_dir());

        ensure_dir_exists(&nested).expect("existing directory is accepted");
    }

    #[test]
    fn ensure_parent_dir_returns_created_parent() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let file = root.join("13.2.0/archive.txz");

        let parent = ensure_parent_dir(&file).expect("create parent");
        assert_eq!(parent, root.join("13.2.0"));
        assert!(parent.is_dir());
    }

    #[test]
    fn ensure_parent_dir_rejects_bare_file_names() {
        assert!(ensure_parent_dir(Utf8Path::new("archive.txz")).is_err());
    }
}
