//! Captures tracing output for assertions in behavioural tests.
//!
//! The helpers record logs without timestamps or ANSI colours so assertions
//! can match human-readable messages and structured fields directly.

use std::io::{Result as IoResult, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt;

struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let mut guard = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

fn capture_logs<F, R>(level: Level, action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer_buffer = Arc::clone(&buffer);
    let subscriber = fmt()
        .with_max_level(level)
        .without_time()
        .with_ansi(false)
        .with_writer(move || BufferWriter {
            buffer: Arc::clone(&writer_buffer),
        })
        .finish();

    let result = with_default(subscriber, action);

    let bytes = buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let logs = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_owned)
        .collect();
    (logs, result)
}

/// Runs `action`, capturing debug-and-above logs alongside the closure result.
///
/// # Examples
/// ```
/// use pg_embed_runtime::test_support::capture_debug_logs;
///
/// let (logs, value) = capture_debug_logs(|| {
///     tracing::debug!("cache miss");
///     7
/// });
/// assert!(logs.iter().any(|line| line.contains("cache miss")));
/// assert_eq!(value, 7);
/// ```
#[must_use]
pub fn capture_debug_logs<F, R>(action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    capture_logs(Level::DEBUG, action)
}

/// Runs `action`, capturing warning logs alongside the closure result.
///
/// # Examples
/// ```
/// use pg_embed_runtime::test_support::capture_warn_logs;
///
/// let (logs, value) = capture_warn_logs(|| {
///     tracing::warn!("something happened");
///     41 + 1
/// });
/// assert!(logs.iter().any(|line| line.contains("something happened")));
/// assert_eq!(value, 42);
/// ```
#[must_use]
pub fn capture_warn_logs<F, R>(action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    capture_logs(Level::WARN, action)
}
