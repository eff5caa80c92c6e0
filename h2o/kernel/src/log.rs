use alloc::boxed::Box;
use std::io::{self, Write};

use lpc_call::{Error, Result};
use spin::{Mutex, Once};

struct OptionU32Display(Option<u32>);

impl core::fmt::Display for OptionU32Display {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(val) = self.0 {
            write!(f, "{}", val)
        } else {
            write!(f, "<NULL>")
        }
    }
}

struct Logger {
    output: Mutex<Box<dyn Write + Send>>,
    level: log::Level,
}

impl Logger {
    fn new(level: log::Level, output: Box<dyn Write + Send>) -> Logger {
        Logger {
            output: Mutex::new(output),
            level,
        }
    }
}

impl log::Log for Logger {
    #[inline]
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut os = self.output.lock();

        let res = if record.level() < log::Level::Debug {
            writeln!(os, "{}: {}", record.level(), record.args())
        } else {
            let file = record.file().unwrap_or("<NULL>");
            let line = OptionU32Display(record.line());
            writeln!(
                os,
                "{}: [#{} {}:{}] {}",
                record.level(),
                crate::sched::task::thread_id(),
                file,
                line,
                record.args()
            )
        };
        // Nowhere to report a failing log sink.
        let _ = res;
    }

    #[inline]
    fn flush(&self) {
        let _ = self.output.lock().flush();
    }
}

static LOGGER: Once<Logger> = Once::new();

/// Install the kernel logger, writing to standard error.
///
/// # Errors
///
/// Returns `EEXIST` if a logger is already installed.
pub fn init(max_level: log::LevelFilter) -> Result {
    init_with(max_level, Box::new(io::stderr()))
}

/// Install the kernel logger writing to `output`.
///
/// # Errors
///
/// Returns `EEXIST` if a logger is already installed.
pub fn init_with(max_level: log::LevelFilter, output: Box<dyn Write + Send>) -> Result {
    if LOGGER.is_completed() {
        return Err(Error::EEXIST);
    }
    let level = max_level.to_level().unwrap_or(log::Level::Error);
    let logger = LOGGER.call_once(|| Logger::new(level, output));
    log::set_logger(logger).map_err(|_| Error::EEXIST)?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::*;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn format_by_level() {
        let sink = Sink::default();
        let logger = Logger::new(log::Level::Debug, Box::new(sink.clone()));
        let emit = |level: log::Level, msg: &str| {
            log::Log::log(
                &logger,
                &log::Record::builder()
                    .level(level)
                    .args(format_args!("{}", msg))
                    .file(Some("port.rs"))
                    .line(Some(7))
                    .build(),
            )
        };

        emit(log::Level::Warn, "fault");
        emit(log::Level::Debug, "closed");
        emit(log::Level::Trace, "hidden");

        let out = String::from_utf8(sink.0.lock().clone()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("WARN: fault"));
        let debug = lines.next().unwrap();
        assert!(debug.starts_with("DEBUG: [#"));
        assert!(debug.ends_with("port.rs:7] closed"));
        assert_eq!(lines.next(), None);
    }
}
