use crate::sink::LogSink;
use std::error::Error;

/// A sink that simply drops all records.
///
/// Useful for silencing individual levels in the routing table and for
/// measuring formatting overhead without any I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write(&self, _buf: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
