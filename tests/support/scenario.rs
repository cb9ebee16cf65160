//! Unwraps fallible `rstest-bdd` world fixtures inside scenario bodies.

use color_eyre::eyre::Result;

/// Returns the world built by a fixture, or panics naming the scenario whose
/// world could not be constructed.
///
/// Steps receive the fixture as a `Result` and report construction failures
/// themselves; the scenario body calls this so a broken sandbox fails loudly
/// even when no step touched the world.
pub fn expect_fixture<T>(world: Result<T>, scenario: &str) -> T {
    match world {
        Ok(value) => value,
        Err(err) => panic!("{scenario}: world construction failed: {err:?}"),
    }
}
