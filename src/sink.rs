use crate::level::Level;
use std::error::Error;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Synchronous destination for rendered records.
///
/// `write` is called on the emitting thread with the complete bytes of one
/// record. Whether concurrent writes from several threads interleave inside
/// a record depends on the implementation: the sinks in this module hold a
/// lock for the whole write, arbitrary implementations need not.
pub trait LogSink: Send + Sync {
    /// Write one rendered record.
    ///
    /// **Returns**
    /// - `Ok(())` if every byte was accepted.
    /// - `Err(..)` if the destination failed. The emitting call treats this
    ///   as fatal; nothing is retried.
    fn write(&self, buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered bytes. Default implementation is a no-op.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Process standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        io::stdout().lock().write_all(buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        io::stdout().flush()?;
        Ok(())
    }
}

/// Process standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        io::stderr().lock().write_all(buf)?;
        Ok(())
    }
}

/// Any [`Write`] implementation (file, socket, buffer) behind a mutex.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer: Mutex::new(writer) }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write(&self, buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}

/// Growable in-memory buffer; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Non-empty lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(())
    }
}

/// Per-level routing table.
#[derive(Clone)]
pub struct Sinks {
    outputs: [Arc<dyn LogSink>; 7],
}

impl Sinks {
    /// Route every level to the same sink.
    pub fn all(sink: Arc<dyn LogSink>) -> Self {
        Sinks {
            outputs: std::array::from_fn(|_| Arc::clone(&sink)),
        }
    }

    pub fn get(&self, level: Level) -> &Arc<dyn LogSink> {
        &self.outputs[level.index()]
    }

    pub fn set(&mut self, level: Level, sink: Arc<dyn LogSink>) {
        self.outputs[level.index()] = sink;
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Sinks::all(Arc::new(StdoutSink))
    }
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}
