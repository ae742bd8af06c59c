//! Line-oriented text file sink, one file per day

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::format::{render_line, render_transaction};
use super::{ensure_dir, lock_family, today_file_path, EventWriter, TransactionWriter};
use super::TRANSACTION_FILE_SUFFIX;
use crate::error::WriteError;
use crate::event::EventRecord;
use crate::transaction::FlushedTransaction;

/// Serializes every text file write in the process
static TEXT_FILE_LOCK: Mutex<()> = Mutex::new(());

/// Appends rendered lines to `<dir>/<YYYY-MM-DD>.log`
#[derive(Debug, Clone)]
pub struct TextFileWriter {
    dir: PathBuf,
}

impl TextFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Today's file for single events
    pub fn event_path(&self) -> PathBuf {
        today_file_path(&self.dir, "", "log")
    }

    /// Today's file for transaction blocks
    pub fn transaction_path(&self) -> PathBuf {
        today_file_path(&self.dir, TRANSACTION_FILE_SUFFIX, "log")
    }

    fn append(&self, path: &Path, text: &str) -> Result<(), WriteError> {
        let _guard = lock_family(&TEXT_FILE_LOCK);

        ensure_dir(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WriteError::io("open", path, e))?;

        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| WriteError::io("write", path, e))
    }
}

impl EventWriter for TextFileWriter {
    fn write(&self, event: &EventRecord) -> Result<(), WriteError> {
        let (line, rendered) = render_line(event);
        self.append(&self.event_path(), &line)?;
        rendered
    }
}

impl TransactionWriter for TextFileWriter {
    fn write_transaction(&self, transaction: &FlushedTransaction) -> Result<(), WriteError> {
        let (block, rendered) = render_transaction(transaction);
        self.append(&self.transaction_path(), &block)?;
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Attributes;
    use crate::level::Level;
    use chrono::Local;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_text_file_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let writer = TextFileWriter::new(temp_dir.path());

        writer
            .write(&EventRecord::new(
                Level::Info,
                "first",
                Attributes::new().with("varInt", 0).with("varStr", "string"),
            ))
            .unwrap();
        writer
            .write(&EventRecord::new(Level::Error, "second", Attributes::new()))
            .unwrap();

        let content = fs::read_to_string(writer.event_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[info] first [varInt=0] [varStr=string]"));
        assert!(lines[1].ends_with("[error] second"));
    }

    #[test]
    fn test_text_file_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let writer = TextFileWriter::new(temp_dir.path().join("nested").join("logs"));

        writer
            .write(&EventRecord::new(Level::Info, "hello", Attributes::new()))
            .unwrap();
        assert!(writer.event_path().exists());
    }

    #[test]
    fn test_text_file_unsupported_keeps_line_terminated() {
        let temp_dir = TempDir::new().unwrap();
        let writer = TextFileWriter::new(temp_dir.path());

        let err = writer
            .write(&EventRecord::new(
                Level::Info,
                "bad",
                Attributes::new().with("flag", true),
            ))
            .unwrap_err();
        assert!(matches!(err, WriteError::UnsupportedAttributeType { .. }));

        writer
            .write(&EventRecord::new(Level::Info, "next", Attributes::new()))
            .unwrap();

        let content = fs::read_to_string(writer.event_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[info] bad"));
        assert!(lines[1].ends_with("[info] next"));
    }

    #[test]
    fn test_text_file_concurrent_writers_do_not_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = Arc::new(TextFileWriter::new(&dir));
                thread::spawn(move || {
                    for i in 0..25 {
                        let event = EventRecord::new(
                            Level::Info,
                            format!("thread {} message {}", t, i),
                            Attributes::new().with("payload", "x".repeat(200)),
                        );
                        writer.write(&event).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(TextFileWriter::new(&dir).event_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.contains("] [info] thread ")));
    }

    #[test]
    fn test_text_file_transaction_block() {
        let temp_dir = TempDir::new().unwrap();
        let writer = TextFileWriter::new(temp_dir.path());

        let now = Local::now();
        let txn = FlushedTransaction {
            transaction_id: "import-7".to_string(),
            start_timestamp: now,
            end_timestamp: now,
            transaction_logs: vec![
                EventRecord::new(Level::Info, "read rows", Attributes::new().with("rows", 10)),
                EventRecord::new(Level::Warning, "skipped", Attributes::new()),
            ],
        };
        writer.write_transaction(&txn).unwrap();

        let path = writer.transaction_path();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_transactions.log"));

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("import-7 started"));
        assert!(lines[1].starts_with("--> "));
        assert!(lines[2].starts_with("--> "));
        assert!(lines[3].contains("import-7 ended"));
    }
}
