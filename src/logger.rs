use crate::dispatch::{self, Dispatch};
use crate::error::LogError;
use crate::level::Level;
use crate::record::FieldSet;
use crate::value::Value;
use std::sync::Arc;

/// Field-carrying handle onto a [`Dispatch`].
///
/// A logger never changes after construction: [`Logger::with`] returns a new
/// logger and leaves the receiver untouched, so one base logger can be
/// shared and extended from many threads without locking.
#[derive(Clone)]
pub struct Logger {
    fields: Arc<FieldSet>,
    dispatch: Arc<Dispatch>,
}

impl Logger {
    /// Logger with no fields on the process-wide dispatch.
    pub fn new() -> Self {
        Self::with_dispatch(dispatch::global())
    }

    /// Logger with no fields on an explicit dispatch.
    pub fn with_dispatch(dispatch: Arc<Dispatch>) -> Self {
        Logger {
            fields: Arc::new(FieldSet::new()),
            dispatch,
        }
    }

    /// New logger carrying every current field plus `key`, replacing any
    /// previous value of `key`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Logger {
        let mut fields = FieldSet::clone(&self.fields);
        fields.insert(key.into(), value.into());
        Logger {
            fields: Arc::new(fields),
            dispatch: Arc::clone(&self.dispatch),
        }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn dispatch(&self) -> &Arc<Dispatch> {
        &self.dispatch
    }

    /// Emit at `level`, panicking on formatter or sink failure unless the
    /// dispatch is configured otherwise.
    pub fn log(&self, level: Level, template: &str, args: &[Value]) {
        self.dispatch.emit(level, &self.fields, template, args);
    }

    pub fn try_log(&self, level: Level, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.dispatch.try_emit(level, &self.fields, template, args)
    }

    pub fn trace(&self, template: &str, args: &[Value]) {
        self.log(Level::Trace, template, args);
    }

    pub fn debug(&self, template: &str, args: &[Value]) {
        self.log(Level::Debug, template, args);
    }

    pub fn info(&self, template: &str, args: &[Value]) {
        self.log(Level::Info, template, args);
    }

    pub fn warn(&self, template: &str, args: &[Value]) {
        self.log(Level::Warn, template, args);
    }

    pub fn error(&self, template: &str, args: &[Value]) {
        self.log(Level::Error, template, args);
    }

    pub fn fatal(&self, template: &str, args: &[Value]) {
        self.log(Level::Fatal, template, args);
    }

    /// Emits at [`Level::Panic`]. Like every other level this only logs; it
    /// does not unwind.
    pub fn panic(&self, template: &str, args: &[Value]) {
        self.log(Level::Panic, template, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("fields", &self.fields).finish_non_exhaustive()
    }
}
