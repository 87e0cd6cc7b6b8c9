use crate::destination::EmitError;
use std::fs::File;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Thread-safe, closable line writer shared by every destination derived
/// from the same output.
///
/// Each record is written with a single `write_all` under the lock, so
/// lines from concurrent callers never interleave.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        SharedWriter { inner: Arc::new(Mutex::new(Some(Box::new(writer)))) }
    }

    pub fn stdout() -> Self {
        SharedWriter::new(io::stdout())
    }

    pub fn file(file: File) -> Self {
        SharedWriter::new(file)
    }

    /// Write one already-encoded line, newline included.
    pub fn write_line(&self, line: &[u8]) -> Result<(), EmitError> {
        let mut guard = self.inner.lock().map_err(|_| EmitError::Poisoned)?;
        let writer = guard.as_mut().ok_or(EmitError::Closed)?;
        writer.write_all(line)?;
        Ok(())
    }

    /// Flush and release the underlying writer. Later writes fail with
    /// [`EmitError::Closed`]; closing twice is a no-op.
    pub fn close(&self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        match guard.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closed = match self.inner.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        };
        f.debug_struct("SharedWriter").field("closed", &closed).finish()
    }
}

/// In-memory writer for capturing output, cheap to clone.
#[derive(Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        MemoryWriter::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        match self.buf.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory writer lock poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
