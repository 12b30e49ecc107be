use crate::calendar::ParseResult;
use crate::error::ParseErrorKind;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::env;
use std::io::Write;

/// Install the process-wide logger. Returns `false` when a logger was
/// already installed, which is not an error for embedding callers.
pub fn init_logging() -> bool {
    let env = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level = parse_level(&env);

    let mut builder = Builder::from_default_env();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        let target = record.target();
        let file = record.file().unwrap_or("unknown");
        let line = record.line().unwrap_or(0);

        match record.level() {
            Level::Info => {
                writeln!(buf, "{} [INFO] [{}]: {}", timestamp, target, record.args())
            }
            level => {
                writeln!(buf,
                    "{} [{}] [{}:{}] {}: {}",
                    timestamp, level, file, line, target, record.args()
                )
            }
        }
    });

    // Keep the runtime quiet in production
    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("tokio", LevelFilter::Info);
    }

    builder.filter_level(log_level)
           .target(Target::Stdout)
           .try_init()
           .is_ok()
}

fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

pub fn log_error_with_context(error: &dyn std::error::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    let mut source = error.source();
    while let Some(err) = source {
        log::error!("  Caused by: {}", err);
        source = err.source();
    }
}

pub fn log_parse_result(bytes: usize, result: &ParseResult, duration_ms: u64) {
    match result {
        Ok(events) => {
            log::info!("[Parser] Parsed {} events from {} bytes in {}ms",
                       events.len(), bytes, duration_ms);
        }
        Err(e) if e.kind == ParseErrorKind::NoEventsFound => {
            log::warn!("[Parser] No events found in {} bytes of calendar data", bytes);
        }
        Err(e) => {
            log::warn!("[Parser] Rejected {} bytes as malformed: {}", bytes, e.detail);
        }
    }
}

pub fn log_store_operation(operation: &str, id: &str, live_entries: usize) {
    log::debug!("[Store] {} {} ({} live entries)", operation, id, live_entries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_level("error"), LevelFilter::Error);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
    }

    #[test]
    #[serial]
    fn test_init_logging_twice_is_harmless() {
        init_logging();
        assert!(!init_logging());
    }
}
