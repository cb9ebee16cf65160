//! Shared archive cache for `PostgreSQL` downloads.
//!
//! Archives are stored in a user-specific cache directory keyed by version so
//! configurations that differ only in port or credentials reuse one download.
//!
//! # Cache Location
//!
//! The cache root is resolved in the following order:
//!
//! 1. `PG_BINARY_CACHE_DIR` environment variable if set
//! 2. `$XDG_CACHE_HOME/pg-embed/archives` if `XDG_CACHE_HOME` is set
//! 3. `~/.cache/pg-embed/archives` when a home directory is known
//! 4. `pg-embed/archives` under the system temporary directory
//!
//! # Cross-Process Coordination
//!
//! Downloads are serialised with a per-archive exclusive file lock, allowing
//! different versions to be fetched concurrently.

mod config;
mod locator;
mod lock;

pub use config::{CACHE_DIR_ENV, resolve_cache_root};
pub use locator::{CacheLocator, DefaultCacheLocator, archive_file_name};
pub use lock::CacheLock;
