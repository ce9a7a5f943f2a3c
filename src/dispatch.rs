//! Emission core.
//!
//! A [`Dispatch`] owns the threshold, the active formatter and the per-level
//! routing table as one immutable [`Config`] snapshot. Every emission loads
//! the current snapshot once; setters build a new snapshot and swap it in,
//! so an emission never observes a half-applied update.

use crate::error::LogError;
use crate::format::{Formatter, JsonFormatter};
use crate::level::Level;
use crate::record::{FieldSet, Record};
use crate::sink::{LogSink, Sinks};
use crate::value::Value;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Context key under which the middleware publishes the request logger.
pub const DEFAULT_CONTEXT_KEY: &str = "logger";

/// Target of the diagnostics the dispatch reports about itself.
pub(crate) const INTERNAL_TARGET: &str = "fieldlog::dispatch";

/// What an emission does when formatting or writing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Panic on the emitting thread.
    #[default]
    Panic,
    /// Report the error on stderr and drop the record.
    Stderr,
}

/// Emission configuration.
///
/// **Fields**
/// - `level`: records strictly below this level are discarded.
/// - `formatter`: renders every emitted record.
/// - `sinks`: destination per level.
/// - `failure_policy`: reaction to formatter or sink errors.
/// - `context_key`: request-context key used by the HTTP middleware.
#[derive(Clone)]
pub struct Config {
    pub level: Level,
    pub formatter: Arc<dyn Formatter>,
    pub sinks: Sinks,
    pub failure_policy: FailurePolicy,
    pub context_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            formatter: Arc::new(JsonFormatter::new()),
            sinks: Sinks::default(),
            failure_policy: FailurePolicy::default(),
            context_key: DEFAULT_CONTEXT_KEY.to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("failure_policy", &self.failure_policy)
            .field("context_key", &self.context_key)
            .finish_non_exhaustive()
    }
}

/// Shared emission core. Cheap to share behind an `Arc`.
pub struct Dispatch {
    config: ArcSwap<Config>,
}

static GLOBAL: LazyLock<Arc<Dispatch>> = LazyLock::new(|| Arc::new(Dispatch::default()));

/// Process-wide dispatch used by [`crate::Logger::new`] and the
/// package-level functions.
pub fn global() -> Arc<Dispatch> {
    Arc::clone(&GLOBAL)
}

impl Dispatch {
    pub fn new(config: Config) -> Self {
        Dispatch {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Replace the whole configuration.
    pub fn set_config(&self, config: Config) {
        tracing::debug!(target: INTERNAL_TARGET, ?config, "replacing logger configuration");
        self.config.store(Arc::new(config));
    }

    /// Apply `f` to a copy of the current configuration and swap it in.
    /// Concurrent updates are retried, never lost.
    pub fn update(&self, f: impl Fn(&mut Config)) {
        self.config.rcu(|current| {
            let mut next = Config::clone(current);
            f(&mut next);
            next
        });
    }

    pub fn level(&self) -> Level {
        self.config.load().level
    }

    pub fn set_level(&self, level: Level) {
        self.update(|c| c.level = level);
    }

    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        self.update(|c| c.formatter = Arc::clone(&formatter));
    }

    /// Route a single level to `sink`.
    pub fn set_output(&self, level: Level, sink: Arc<dyn LogSink>) {
        self.update(|c| c.sinks.set(level, Arc::clone(&sink)));
    }

    /// Route every level to `sink`.
    pub fn set_outputs(&self, sink: Arc<dyn LogSink>) {
        self.update(|c| c.sinks = Sinks::all(Arc::clone(&sink)));
    }

    pub fn set_failure_policy(&self, policy: FailurePolicy) {
        self.update(|c| c.failure_policy = policy);
    }

    pub fn context_key(&self) -> String {
        self.config.load().context_key.clone()
    }

    pub fn set_context_key(&self, key: impl Into<String>) {
        let key = key.into();
        self.update(|c| c.context_key = key.clone());
    }

    /// Gate, render and write one record.
    ///
    /// Returns `Ok(())` without touching the formatter or any sink when
    /// `level` is below the threshold.
    pub fn try_emit(
        &self,
        level: Level,
        fields: &FieldSet,
        template: &str,
        args: &[Value],
    ) -> Result<(), LogError> {
        let config = self.config.load();
        if !level.is_at_least(config.level) {
            return Ok(());
        }

        let record = Record::new(level, fields, template, args);
        let bytes = config.formatter.format(&record).map_err(LogError::Format)?;
        config
            .sinks
            .get(level)
            .write(&bytes)
            .map_err(|source| LogError::Sink { level, source })
    }

    /// Like [`Dispatch::try_emit`], applying the configured
    /// [`FailurePolicy`] to errors.
    ///
    /// # Panics
    ///
    /// Panics on formatter or sink failure under [`FailurePolicy::Panic`].
    pub fn emit(&self, level: Level, fields: &FieldSet, template: &str, args: &[Value]) {
        if let Err(err) = self.try_emit(level, fields, template, args) {
            match self.config.load().failure_policy {
                FailurePolicy::Panic => panic!("{err}"),
                FailurePolicy::Stderr => {
                    eprintln!("fieldlog: dropping record: {err}");
                    tracing::warn!(target: INTERNAL_TARGET, error = %err, "log record dropped");
                }
            }
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Dispatch::new(Config::default())
    }
}
