//! Runs behavioural scenarios one at a time within a test binary.
//!
//! Scenarios capture tracing output through a thread-default subscriber and
//! share sandbox naming, so they hold this guard for their whole run.

use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use rstest::fixture;

static ACQUISITION_SCENARIOS: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Keeps other scenarios out until dropped.
#[derive(Debug)]
#[must_use = "the scenario is only serialised while the guard is alive"]
pub struct ScenarioSerialGuard {
    _guard: MutexGuard<'static, ()>,
}

/// Acquires the scenario lock, recovering it if an earlier scenario panicked.
#[fixture]
pub fn serial_guard() -> ScenarioSerialGuard {
    ScenarioSerialGuard {
        _guard: ACQUISITION_SCENARIOS
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    }
}
