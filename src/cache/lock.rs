//! Cross-process file locking for cache coordination.
//!
//! Serialises archive downloads across parallel test runners. On Unix systems
//! this uses `flock(2)` for advisory locking. On other platforms locking is a
//! no-op and the atomic rename in the fetch strategy is the only guard.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{File, OpenOptions};
use std::io;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Subdirectory next to cached archives holding lock files.
const LOCKS_SUBDIR: &str = ".locks";

/// Guard that holds a file lock until dropped.
#[derive(Debug)]
pub struct CacheLock {
    _file: File,
    path: Utf8PathBuf,
}

impl CacheLock {
    /// Acquires an exclusive lock guarding the archive at `archive`.
    ///
    /// The lock file lives at `<archive dir>/.locks/<archive name>.lock`, so
    /// custom cache locators get the same coordination as the default one.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or the lock cannot
    /// be acquired.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use pg_embed_runtime::CacheLock;
    ///
    /// let archive = Utf8Path::new("/tmp/pg-cache/13.2.0/postgres.txz");
    /// let _lock = CacheLock::acquire_exclusive(archive)?;
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn acquire_exclusive(archive: &Utf8Path) -> io::Result<Self> {
        let path = lock_path_for(archive)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        lock_exclusive(&file)?;
        Ok(Self { _file: file, path })
    }

    /// Path of the lock file backing this guard.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

fn lock_path_for(archive: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let (Some(parent), Some(name)) = (archive.parent(), archive.file_name()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{archive} does not name a file"),
        ));
    };
    Ok(parent.join(LOCKS_SUBDIR).join(format!("{name}.lock")))
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    // SAFETY: The descriptor comes from an open `File` borrowed for the
    // duration of the call, so it stays valid until `flock` returns.
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}
