use crate::dispatch::{self, Dispatch, INTERNAL_TARGET};
use crate::level::Level;
use crate::record::FieldSet;
use crate::value::Value;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that forwards `tracing` events into a
/// [`Dispatch`], so libraries instrumented with `tracing` end up in the same
/// sinks and format as [`crate::Logger`] output.
///
/// Event fields become record fields, the `message` field becomes the
/// message, and the event target is recorded as a `target` field. The
/// dispatch's own diagnostics are skipped so a failing sink cannot recurse.
pub struct BridgeLayer {
    dispatch: Arc<Dispatch>,
}

impl BridgeLayer {
    pub fn new(dispatch: Arc<Dispatch>) -> Self {
        BridgeLayer { dispatch }
    }

    /// Bridge into the process-wide dispatch.
    pub fn global() -> Self {
        Self::new(dispatch::global())
    }
}

/// Map a `tracing` level onto the nearest [`Level`].
pub fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        _ => Level::Error,
    }
}

impl<S> Layer<S> for BridgeLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == INTERNAL_TARGET {
            return;
        }
        let level = map_level(meta.level());
        if !level.is_at_least(self.dispatch.level()) {
            return;
        }

        let mut fields = FieldSet::new();
        let mut message = None;
        event.record(&mut FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        });
        fields.insert("target".to_string(), Value::from(meta.target()));

        let args = [Value::from(message.unwrap_or_default())];
        self.dispatch.emit(level, &fields, "%s", &args);
    }
}

/// Collects `tracing` event fields into a [`FieldSet`], keeping the
/// `message` field apart.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut FieldSet,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Config;
    use crate::format::JsonFormatter;
    use crate::sink::{MemorySink, Sinks};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn bridged(level: Level) -> (Registry, MemorySink, Arc<Dispatch>) {
        let sink = MemorySink::new();
        let dispatch = Arc::new(Dispatch::new(Config {
            level,
            formatter: Arc::new(JsonFormatter::without_time()),
            sinks: Sinks::all(Arc::new(sink.clone())),
            ..Config::default()
        }));
        (Registry::default(), sink, dispatch)
    }

    #[test]
    fn events_become_records() {
        let (registry, sink, dispatch) = bridged(Level::Trace);
        let subscriber = registry.with(BridgeLayer::new(dispatch));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "billing", user_id = 42, ok = false, "charge %d failed");
        });

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "level": "WARN",
                "msg": "charge %d failed",
                "ok": false,
                "target": "billing",
                "user_id": 42,
            })
        );
    }

    #[test]
    fn threshold_applies_to_bridged_events() {
        let (registry, sink, dispatch) = bridged(Level::Warn);
        let subscriber = registry.with(BridgeLayer::new(dispatch));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "dropped");
            tracing::error!(target: "app", "kept");
        });

        assert_eq!(sink.lines().len(), 1);
        assert!(sink.contents().contains("\"msg\":\"kept\""));
    }

    #[test]
    fn only_internal_diagnostics_are_skipped() {
        let (registry, sink, dispatch) = bridged(Level::Trace);
        let subscriber = registry.with(BridgeLayer::new(dispatch));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "fieldlog_app", "from a user crate");
            tracing::info!(target: "fieldlog::layer::tests", "from this crate");
            tracing::warn!(target: INTERNAL_TARGET, "log record dropped");
        });

        let targets: Vec<String> = sink
            .lines()
            .iter()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["target"].to_string())
            .collect();
        assert_eq!(targets, ["\"fieldlog_app\"", "\"fieldlog::layer::tests\""]);
    }

    #[test]
    fn maps_every_tracing_level() {
        assert_eq!(map_level(&tracing::Level::TRACE), Level::Trace);
        assert_eq!(map_level(&tracing::Level::DEBUG), Level::Debug);
        assert_eq!(map_level(&tracing::Level::INFO), Level::Info);
        assert_eq!(map_level(&tracing::Level::WARN), Level::Warn);
        assert_eq!(map_level(&tracing::Level::ERROR), Level::Error);
    }
}
