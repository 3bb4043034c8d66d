//! Kernel logger
//!
//! Implements the `log::Log` trait to route log messages to the console.
//! Compile-time filtering comes from the crate's `log_*` features, runtime
//! filtering from the level passed to [`init`].

use core::fmt::{self, Write};

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::console::{Console, ConsoleWriter};

/// Global logger instance
static LOGGER: KernelLogger = KernelLogger { sink: Once::new() };

struct KernelLogger {
    sink: Once<&'static (dyn Console + Sync)>,
}

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.sink.is_completed() && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = self.sink.get() {
            let _ = write_record(&mut ConsoleWriter(*console), record);
        }
    }

    fn flush(&self) {}
}

/// Format one record as `[LEVEL] message`.
fn write_record(out: &mut impl Write, record: &Record) -> fmt::Result {
    writeln!(out, "[{}] {}", record.level(), record.args())
}

/// Install the logger on `console`.
///
/// Fails if a logger is already installed.
pub fn init(
    console: &'static (dyn Console + Sync),
    max_level: LevelFilter,
) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    LOGGER.sink.call_once(|| console);
    log::set_max_level(max_level);
    log::info!("[KERNEL] Logger initialized with level: {}", max_level);
    Ok(())
}
