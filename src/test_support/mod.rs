//! Internal helpers re-exported for integration tests.
//!
//! Provides fake distributions, counting strategy doubles, and log capture so
//! suites can observe how many fetches and extractions the pipeline performs
//! without touching the network.

mod archive;
mod fakes;
mod logging;

pub use archive::{
    FAKE_DISTRIBUTION_FILES, fake_distribution_bytes, fake_jar_bytes, write_fake_distribution,
};
pub use fakes::{CountingFetch, CountingUnpacker};
pub use logging::{capture_debug_logs, capture_warn_logs};
