//! Minimal stderr logger for the host binary.

use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    started: Instant,
}

static LOGGER: std::sync::OnceLock<ConsoleLogger> = std::sync::OnceLock::new();

/// Install the console logger as the global `log` backend.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| ConsoleLogger {
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

impl ConsoleLogger {
    fn line(&self, record: &Record<'_>) -> String {
        let elapsed = self.started.elapsed();
        format!(
            "[{:>5}.{:03}] {:<5} {}: {}",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{}", self.line(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
