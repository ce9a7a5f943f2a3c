use crate::level::Level;
use crate::value::{render_message, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// Key/value mapping carried by a [`crate::Logger`]; keys are unique and
/// iterate in sorted order.
pub type FieldSet = BTreeMap<String, Value>;

/// One log event, built fresh for each emission and borrowed by the
/// formatter for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub template: &'a str,
    pub args: &'a [Value],
    pub fields: &'a FieldSet,
}

impl<'a> Record<'a> {
    pub fn new(level: Level, fields: &'a FieldSet, template: &'a str, args: &'a [Value]) -> Self {
        Record {
            timestamp: Utc::now(),
            level,
            template,
            args,
            fields,
        }
    }

    /// The message with its arguments substituted.
    pub fn message(&self) -> String {
        render_message(self.template, self.args)
    }

    /// RFC3339 UTC timestamp with second precision.
    pub fn time_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
