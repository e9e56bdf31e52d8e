//! In-memory logger for asserting on log output in unit tests

use std::sync::{Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
static INIT: Once = Once::new();

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = RECORDS.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Route every log record into the capture buffer (idempotent)
pub(crate) fn capture() {
    INIT.call_once(|| {
        if log::set_logger(&CaptureLogger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Whether a record at `level` containing `needle` has been logged.
///
/// Tests share the buffer, so needles should be unique to the test.
pub(crate) fn logged(level: Level, needle: &str) -> bool {
    RECORDS
        .lock()
        .map(|records| {
            records
                .iter()
                .any(|(l, message)| *l == level && message.contains(needle))
        })
        .unwrap_or(false)
}
