//! Package-level functions on the process-wide dispatch.
//!
//! Every test mutates global state, so they run one at a time behind
//! `GLOBAL_LOCK` and restore the defaults when done.

use fieldlog::{
    args, dispatch, Config, Formatter, Level, LineFormatter, LogSink, MemorySink, Record,
};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

/// Renders only the message, without a trailing newline.
struct TestFormatter;

impl Formatter for TestFormatter {
    fn format(&self, record: &Record<'_>) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        Ok(record.message().into_bytes())
    }
}

struct Restore<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        dispatch::global().set_config(Config::default());
    }
}

/// Route every level to one buffer at the Trace threshold.
fn mock_outputs(formatter: Arc<dyn Formatter>) -> (Restore<'static>, MemorySink) {
    let guard = GLOBAL_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let out = MemorySink::new();
    fieldlog::set_outputs(Arc::new(out.clone()));
    fieldlog::set_formatter(formatter);
    fieldlog::set_level(Level::Trace);
    (Restore(guard), out)
}

#[test]
fn package_functions_log_at_their_level() {
    let cases: [(fn(&str, &[fieldlog::Value]), &str); 7] = [
        (fieldlog::trace, "trace"),
        (fieldlog::debug, "debug"),
        (fieldlog::info, "info"),
        (fieldlog::warn, "warn"),
        (fieldlog::error, "error"),
        (fieldlog::fatal, "fatal"),
        (fieldlog::panic, "panic"),
    ];

    let (_restore, out) = mock_outputs(Arc::new(TestFormatter));
    for (log, name) in cases {
        out.clear();
        log(&format!("{name} msg"), &[]);
        assert_eq!(out.contents(), format!("{name} msg"));

        out.clear();
        log(&format!("{name} msg %s"), &args!["with args"]);
        assert_eq!(out.contents(), format!("{name} msg with args"));
    }
}

#[test]
fn threshold_counts_per_level() {
    let (_restore, out) = mock_outputs(Arc::new(LineFormatter::without_time()));
    for (i, threshold) in Level::ALL.iter().enumerate() {
        out.clear();
        fieldlog::set_level(*threshold);
        for level in Level::ALL {
            fieldlog::log(level, "custom msg", &[]);
        }
        assert_eq!(out.contents().matches("custom msg").count(), Level::ALL.len() - i);
    }
}

#[test]
fn different_outputs_by_level() {
    let (_restore, _) = mock_outputs(Arc::new(TestFormatter));
    let outputs: Vec<MemorySink> = Level::ALL.iter().map(|_| MemorySink::new()).collect();
    for (level, sink) in Level::ALL.iter().zip(&outputs) {
        fieldlog::set_output(*level, Arc::new(sink.clone()) as Arc<dyn LogSink>);
    }

    for level in Level::ALL {
        fieldlog::log(level, &level.as_str().to_lowercase(), &[]);
    }

    for (level, sink) in Level::ALL.iter().zip(&outputs) {
        assert_eq!(sink.contents(), level.as_str().to_lowercase());
    }
}

#[test]
fn with_fields_on_the_global_dispatch() {
    let (_restore, out) = mock_outputs(Arc::new(LineFormatter::new()));

    fieldlog::with("data", "value").debug("debug msg", &[]);

    let line = out.contents();
    assert!(line.starts_with("Time=\""));
    assert!(line.contains(" Level=\"DEBUG\" Msg=\"debug msg\" data=\"value\""));
}

#[test]
fn chained_loggers_keep_their_own_fields() {
    let (_restore, out) = mock_outputs(Arc::new(LineFormatter::without_time()));

    let l1 = fieldlog::with("f1", "v1");
    let l2 = l1.with("f2", "v2");
    let l3 = l2.with("f3", "v3");

    let cases = [
        (&l1, vec!["f1=\"v1\""], vec!["f2=\"v2\"", "f3=\"v3\""]),
        (&l2, vec!["f1=\"v1\"", "f2=\"v2\""], vec!["f3=\"v3\""]),
        (&l3, vec!["f1=\"v1\"", "f2=\"v2\"", "f3=\"v3\""], vec![]),
    ];
    for (logger, contains, not_contains) in cases {
        out.clear();
        logger.debug("msg", &[]);
        let line = out.contents();
        for s in contains {
            assert!(line.contains(s), "{line} lacks {s}");
        }
        for s in not_contains {
            assert!(!line.contains(s), "{line} has {s}");
        }
    }
}

#[test]
fn default_threshold_is_debug() {
    let _guard = GLOBAL_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(dispatch::global().level(), Level::Debug);
    assert_eq!(dispatch::global().context_key(), "logger");
}

#[test]
fn setters_racing_with_emitters() {
    let (_restore, out) = mock_outputs(Arc::new(LineFormatter::without_time()));

    std::thread::scope(|s| {
        s.spawn(|| {
            for n in 0..500 {
                let level = if n % 2 == 0 { Level::Trace } else { Level::Info };
                fieldlog::set_level(level);
            }
            fieldlog::set_level(Level::Trace);
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..250 {
                    fieldlog::info("steady", &[]);
                    fieldlog::debug("flaky", &[]);
                }
            });
        }
    });

    let lines = out.lines();
    assert_eq!(lines.iter().filter(|l| l.contains("steady")).count(), 1000);
    for line in lines {
        assert!(
            line == "Level=\"INFO\" Msg=\"steady\"" || line == "Level=\"DEBUG\" Msg=\"flaky\"",
            "unexpected record: {line}"
        );
    }
}
