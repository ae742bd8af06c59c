//! Single-event logger
//!
//! Gates each call against the threshold, stamps an [`EventRecord`] and
//! hands it to one writer. Write failures are reported through `tracing`
//! and never reach the caller.

use std::sync::{Arc, OnceLock};

use crate::config::LoggerSection;
use crate::event::{Attributes, EventRecord};
use crate::level::{passes, Level};
use crate::writer::{ConsoleWriter, EventWriter};

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Level-gated dispatcher to one [`EventWriter`]
#[derive(Clone)]
pub struct Logger {
    threshold: Level,
    writer: Arc<dyn EventWriter>,
}

impl Logger {
    /// Builder with default settings (info, console)
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Initialize the process-wide logger once
    ///
    /// The first call builds the logger from `section` and then applies
    /// `overrides`; later calls return that same logger and ignore their
    /// arguments.
    pub fn init_global(
        section: &LoggerSection,
        overrides: impl FnOnce(LoggerBuilder) -> LoggerBuilder,
    ) -> &'static Logger {
        GLOBAL_LOGGER.get_or_init(|| overrides(LoggerBuilder::from_config(section)).build())
    }

    /// The process-wide logger, if initialized
    pub fn global() -> Option<&'static Logger> {
        GLOBAL_LOGGER.get()
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// Whether an event at `level` would be recorded
    pub fn enabled(&self, level: Level) -> bool {
        passes(level, self.threshold)
    }

    /// Record an event if `level` passes the threshold
    pub fn log(&self, level: Level, message: impl Into<String>, attributes: Attributes) {
        if !self.enabled(level) {
            return;
        }

        let event = EventRecord::new(level, message, attributes);
        if let Err(e) = self.writer.write(&event) {
            tracing::warn!("Failed to write log event: {}", e);
        }
    }

    pub fn info(&self, message: impl Into<String>, attributes: Attributes) {
        self.log(Level::Info, message, attributes);
    }

    pub fn warning(&self, message: impl Into<String>, attributes: Attributes) {
        self.log(Level::Warning, message, attributes);
    }

    pub fn error(&self, message: impl Into<String>, attributes: Attributes) {
        self.log(Level::Error, message, attributes);
    }

    pub fn debug(&self, message: impl Into<String>, attributes: Attributes) {
        self.log(Level::Debug, message, attributes);
    }
}

/// Builder for [`Logger`]
///
/// Overrides are applied in call order on top of the seeded values, so
/// the last call for a setting wins.
pub struct LoggerBuilder {
    threshold: Level,
    writer: Arc<dyn EventWriter>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            threshold: Level::Info,
            writer: Arc::new(ConsoleWriter::stdout()),
        }
    }
}

impl LoggerBuilder {
    /// Builder seeded from the `[logger]` configuration section
    pub fn from_config(section: &LoggerSection) -> Self {
        Self {
            threshold: section.level(),
            writer: section
                .output_writer()
                .event_writer(&section.output_directory()),
        }
    }

    pub fn level(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn writer(mut self, writer: Arc<dyn EventWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            threshold: self.threshold,
            writer: self.writer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteError;
    use crate::writer::{JsonFileWriter, MemoryWriter};
    use std::thread;
    use tempfile::TempDir;

    fn logger(threshold: Level) -> (Logger, Arc<MemoryWriter>) {
        let writer = Arc::new(MemoryWriter::default());
        let logger = Logger::builder()
            .level(threshold)
            .writer(writer.clone())
            .build();
        (logger, writer)
    }

    fn log_all(logger: &Logger) {
        logger.info("test info", Attributes::new());
        logger.warning("test warning", Attributes::new());
        logger.error("test error", Attributes::new());
        logger.debug("test debug", Attributes::new());
    }

    fn messages(writer: &MemoryWriter) -> Vec<String> {
        writer
            .events()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }

    #[test]
    fn test_logging_off() {
        let (logger, writer) = logger(Level::Off);
        log_all(&logger);
        assert_eq!(writer.event_count(), 0);
    }

    #[test]
    fn test_info_threshold() {
        let (logger, writer) = logger(Level::Info);
        log_all(&logger);
        assert_eq!(messages(&writer), vec!["test info"]);
    }

    #[test]
    fn test_error_threshold() {
        let (logger, writer) = logger(Level::Error);
        log_all(&logger);
        assert_eq!(
            messages(&writer),
            vec!["test info", "test warning", "test error"]
        );
    }

    #[test]
    fn test_debug_threshold() {
        let (logger, writer) = logger(Level::Debug);
        log_all(&logger);
        assert_eq!(writer.event_count(), 4);
    }

    #[test]
    fn test_every_level_threshold_pair() {
        for threshold in Level::ALL {
            for level in Level::ALL {
                let (logger, writer) = logger(threshold);
                logger.log(level, "probe", Attributes::new());
                assert_eq!(
                    writer.event_count() == 1,
                    threshold != Level::Off && level.rank() <= threshold.rank(),
                    "level={} threshold={}",
                    level,
                    threshold
                );
            }
        }
    }

    #[test]
    fn test_records_are_stamped_with_level_and_attributes() {
        let (logger, writer) = logger(Level::Info);
        logger.info("stamped", Attributes::new().with("user", "ana").with("n", 3));

        let events = writer.events();
        assert_eq!(events[0].level(), Level::Info);
        assert_eq!(events[0].attributes().len(), 2);
    }

    #[test]
    fn test_write_failure_does_not_reach_caller() {
        struct Broken;
        impl EventWriter for Broken {
            fn write(&self, _: &EventRecord) -> Result<(), WriteError> {
                Err(WriteError::Console(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "gone",
                )))
            }
        }

        let logger = Logger::builder().writer(Arc::new(Broken)).build();
        logger.info("dropped", Attributes::new());
        logger.error("dropped", Attributes::new().with("flag", true));
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let section = LoggerSection {
            level: "warning".to_string(),
            ..LoggerSection::default()
        };
        let seeded = LoggerBuilder::from_config(&section).build();
        assert_eq!(seeded.threshold(), Level::Warning);

        let overridden = LoggerBuilder::from_config(&section)
            .level(Level::Off)
            .level(Level::Debug)
            .build();
        assert_eq!(overridden.threshold(), Level::Debug);
    }

    #[test]
    fn test_from_config_selects_json_writer() {
        let temp_dir = TempDir::new().unwrap();
        let section = LoggerSection {
            level: "debug".to_string(),
            output_writer: "jsonFile".to_string(),
            output_directory: temp_dir.path().to_string_lossy().into_owned(),
            ..LoggerSection::default()
        };

        let logger = LoggerBuilder::from_config(&section).build();
        logger.debug("to disk", Attributes::new().with("k", 1));

        let path = JsonFileWriter::new(temp_dir.path()).event_path();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("[\n  {"));
        assert!(content.contains("\"message\": \"to disk\""));
    }

    #[test]
    fn test_concurrent_logging() {
        let (logger, writer) = logger(Level::Info);
        let logger = Arc::new(logger);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..50 {
                        logger.info(format!("{}-{}", t, i), Attributes::new());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(writer.event_count(), 400);
    }

    #[test]
    fn test_global_is_initialized_once() {
        let section = LoggerSection::default();
        let memory = Arc::new(MemoryWriter::default());

        let writer = memory.clone();
        let first = Logger::init_global(&section, move |b| {
            b.level(Level::Error).writer(writer)
        });
        let second = Logger::init_global(&section, |b| b.level(Level::Off));

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.threshold(), Level::Error);
        assert!(std::ptr::eq(Logger::global().unwrap(), first));

        second.warning("through global", Attributes::new());
        assert_eq!(memory.event_count(), 1);
    }
}
