//! Shared destination for engine process output.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to a writer receiving `PostgreSQL` process output.
///
/// The acquisition pipeline never writes to the sink; it is carried through
/// to the process-lifecycle component. Clones share the same writer.
///
/// # Examples
/// ```
/// use std::io::Write;
///
/// use pg_embed_runtime::OutputSink;
///
/// let mut sink = OutputSink::new(Vec::new());
/// writeln!(sink, "database system is ready")?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<dyn Write + Send>>,
}

impl OutputSink {
    /// Wraps an arbitrary writer.
    #[must_use]
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Sink forwarding to the process standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Locks the underlying writer.
    pub fn lock(&self) -> MutexGuard<'_, dyn Write + Send + 'static> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports whether two handles share one writer.
    #[must_use]
    pub fn same_writer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.writer, &other.writer)
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}
