//! Logging backend for the `log` facade
//!
//! Records are formatted into a fixed-capacity line and forwarded to the
//! board [`Console`], so logging never allocates and is usable from trap
//! context.

use core::fmt;

use log::{LevelFilter, Log, Metadata, Record};

use crate::utils::console::{format_line, Console, LineBuffer};
use crate::{Error, Result};

/// Get the compile-time log level
pub fn level() -> LevelFilter {
    if cfg!(feature = "debug") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// `log::Log` implementation writing through a [`Console`]
pub struct ConsoleLogger {
    console: spin::Once<&'static dyn Console>,
}

impl ConsoleLogger {
    /// Create a logger with no console attached
    pub const fn new() -> Self {
        Self {
            console: spin::Once::new(),
        }
    }

    /// Attach the console. Only the first call has any effect.
    pub fn attach(&self, console: &'static dyn Console) {
        self.console.call_once(|| console);
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(console) = self.console.get() {
            let line = format_record(record.level(), record.target(), *record.args());
            console.emit_line(&line);
        }
    }

    fn flush(&self) {}
}

/// Format a record as `[LEVEL] target: message`
pub fn format_record(level: log::Level, target: &str, args: fmt::Arguments<'_>) -> LineBuffer {
    format_line(format_args!("[{:<5}] {}: {}", level, target, args))
}

static LOGGER: ConsoleLogger = ConsoleLogger::new();

/// Install the console logger as the global `log` backend
pub fn init(console: &'static dyn Console) -> Result<()> {
    LOGGER.attach(console);
    log::set_logger(&LOGGER).map_err(|_| Error::LoggerUnavailable)?;
    log::set_max_level(level());
    Ok(())
}
