//! Leveled, field-chaining logger.
//!
//! Records are gated by a threshold [`Level`], rendered by a pluggable
//! [`Formatter`] and written to a per-level [`LogSink`]. [`Logger`] carries
//! an immutable set of fields that grows through [`Logger::with`], and
//! [`middleware::RequestLoggerLayer`] gives every HTTP request its own
//! logger plus one summary record.
//!
//! ```
//! use fieldlog::{args, Logger};
//!
//! let logger = Logger::new().with("component", "disk");
//! logger.info("error %s: %d", &args!["sda", 5]);
//! ```

pub mod dispatch;
pub mod env;
pub mod error;
pub mod format;
pub mod init;
pub mod layer;
pub mod level;
pub mod logger;
pub mod middleware;
pub mod noop_sink;
pub mod record;
pub mod sink;
pub mod value;

pub use dispatch::{Config, Dispatch, FailurePolicy};
pub use error::LogError;
pub use format::{Formatter, JsonFormatter, LineFormatter};
pub use level::Level;
pub use logger::Logger;
pub use record::{FieldSet, Record};
pub use sink::{LogSink, MemorySink, Sinks, StderrSink, StdoutSink, WriterSink};
pub use value::{render_message, Value};

use std::sync::Arc;

/// Logger on the process-wide dispatch carrying a single field.
pub fn with(key: impl Into<String>, value: impl Into<Value>) -> Logger {
    Logger::new().with(key, value)
}

pub fn trace(template: &str, args: &[Value]) {
    log(Level::Trace, template, args);
}

pub fn debug(template: &str, args: &[Value]) {
    log(Level::Debug, template, args);
}

pub fn info(template: &str, args: &[Value]) {
    log(Level::Info, template, args);
}

pub fn warn(template: &str, args: &[Value]) {
    log(Level::Warn, template, args);
}

pub fn error(template: &str, args: &[Value]) {
    log(Level::Error, template, args);
}

pub fn fatal(template: &str, args: &[Value]) {
    log(Level::Fatal, template, args);
}

pub fn panic(template: &str, args: &[Value]) {
    log(Level::Panic, template, args);
}

/// Emit a field-less record through the process-wide dispatch.
pub fn log(level: Level, template: &str, args: &[Value]) {
    dispatch::global().emit(level, &FieldSet::new(), template, args);
}

pub fn set_level(level: Level) {
    dispatch::global().set_level(level);
}

pub fn set_formatter(formatter: Arc<dyn Formatter>) {
    dispatch::global().set_formatter(formatter);
}

pub fn set_output(level: Level, sink: Arc<dyn LogSink>) {
    dispatch::global().set_output(level, sink);
}

pub fn set_outputs(sink: Arc<dyn LogSink>) {
    dispatch::global().set_outputs(sink);
}

pub fn set_context_key(key: impl Into<String>) {
    dispatch::global().set_context_key(key);
}
