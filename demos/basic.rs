use std::sync::Arc;

use fieldlog::{args, Level, LineFormatter, StderrSink};

fn main() {
    fieldlog::info("service starting on port %d", &args![8080]);

    let db = fieldlog::with("component", "db").with("pool", 4);
    db.debug("connection pool ready", &[]);
    db.with("query_ms", 812).warn("slow query on %s", &args!["orders"]);

    // Human-readable lines, errors and above on stderr.
    fieldlog::set_formatter(Arc::new(LineFormatter::new()));
    for level in [Level::Error, Level::Fatal, Level::Panic] {
        fieldlog::set_output(level, Arc::new(StderrSink));
    }
    db.error("error %s: %d", &args!["disk", 5]);

    fieldlog::set_level(Level::Warn);
    db.info("suppressed below WARN", &[]);
}
