//! Output writers
//!
//! A sink renders single events through [`EventWriter`] and whole flushed
//! transactions through [`TransactionWriter`]. Each sink type implements
//! both.
//!
//! File sinks name their files after the current local date, one file per
//! day:
//!
//! ```text
//! <output dir>/
//! ├── 2026-01-21.log                 # text events
//! ├── 2026-01-21.json                # JSON array of events
//! ├── 2026-01-21_transactions.log    # text transaction blocks
//! └── 2026-01-21_transactions.json   # JSON array of transactions
//! ```

mod console;
pub mod format;
mod json_file;
pub mod json_array;
mod memory;
mod text_file;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDate};

use crate::error::WriteError;
use crate::event::EventRecord;
use crate::transaction::FlushedTransaction;

pub use console::ConsoleWriter;
pub use json_file::JsonFileWriter;
pub use memory::MemoryWriter;
pub use text_file::TextFileWriter;

/// Date layout used in per-day file names
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Suffix distinguishing transaction files from single-event files
pub const TRANSACTION_FILE_SUFFIX: &str = "_transactions";

/// Sink for single events
pub trait EventWriter: Send + Sync {
    fn write(&self, event: &EventRecord) -> Result<(), WriteError>;
}

/// Sink for flushed transactions
pub trait TransactionWriter: Send + Sync {
    fn write_transaction(&self, transaction: &FlushedTransaction) -> Result<(), WriteError>;
}

/// Writer selected by the `outputWriter` configuration value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputWriterKind {
    #[default]
    Cli,
    JsonFile,
    TextFile,
}

impl OutputWriterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputWriterKind::Cli => "cli",
            OutputWriterKind::JsonFile => "jsonFile",
            OutputWriterKind::TextFile => "textFile",
        }
    }

    /// Resolve a configuration value, falling back to `Cli`
    pub fn from_config(value: &str) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(e) => {
                if !value.trim().is_empty() {
                    tracing::warn!("{}, using {}", e, OutputWriterKind::Cli);
                }
                OutputWriterKind::Cli
            }
        }
    }

    /// Build the single-event sink of this kind
    pub fn event_writer(&self, output_dir: &Path) -> Arc<dyn EventWriter> {
        match self {
            OutputWriterKind::Cli => Arc::new(ConsoleWriter::stdout()),
            OutputWriterKind::JsonFile => Arc::new(JsonFileWriter::new(output_dir)),
            OutputWriterKind::TextFile => Arc::new(TextFileWriter::new(output_dir)),
        }
    }

    /// Build the transaction sink of this kind
    pub fn transaction_writer(&self, output_dir: &Path) -> Arc<dyn TransactionWriter> {
        match self {
            OutputWriterKind::Cli => Arc::new(ConsoleWriter::stdout()),
            OutputWriterKind::JsonFile => Arc::new(JsonFileWriter::new(output_dir)),
            OutputWriterKind::TextFile => Arc::new(TextFileWriter::new(output_dir)),
        }
    }
}

impl fmt::Display for OutputWriterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name an output writer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output writer '{0}'")]
pub struct ParseOutputWriterError(pub String);

impl FromStr for OutputWriterKind {
    type Err = ParseOutputWriterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cli" => Ok(OutputWriterKind::Cli),
            "jsonFile" => Ok(OutputWriterKind::JsonFile),
            "textFile" => Ok(OutputWriterKind::TextFile),
            _ => Err(ParseOutputWriterError(s.to_string())),
        }
    }
}

/// Path of the per-day file for `date`
pub fn daily_file_path(dir: &Path, date: NaiveDate, suffix: &str, extension: &str) -> PathBuf {
    dir.join(format!(
        "{}{}.{}",
        date.format(FILE_DATE_FORMAT),
        suffix,
        extension
    ))
}

/// Path of today's file in local time
pub fn today_file_path(dir: &Path, suffix: &str, extension: &str) -> PathBuf {
    daily_file_path(dir, Local::now().date_naive(), suffix, extension)
}

/// Take a family-wide write lock
///
/// The guarded data is `()`, so a poisoned lock carries no broken state.
fn lock_family(lock: &'static Mutex<()>) -> MutexGuard<'static, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Create the output directory if it does not exist yet
fn ensure_dir(dir: &Path) -> Result<(), WriteError> {
    std::fs::create_dir_all(dir).map_err(|e| WriteError::io("create directory", dir, e))
}
