//! Shared tracing targets for observability instrumentation.
//!
//! Centralises the log targets used by the crate so subscribers can filter
//! acquisition events without pulling in unrelated application logs.

/// Target used by pipeline spans and logs.
pub(crate) const LOG_TARGET: &str = "pg_embed::acquisition";

/// Target used by cache lookup and locking.
pub(crate) const CACHE_LOG_TARGET: &str = "pg_embed::cache";

/// Target used by remote fetch strategies.
pub(crate) const FETCH_LOG_TARGET: &str = "pg_embed::fetch";

/// Target used by archive unpackers.
pub(crate) const UNPACK_LOG_TARGET: &str = "pg_embed::unpack";
