//! JSON array file sink, one file per day

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::json_array::append_element;
use super::{ensure_dir, lock_family, today_file_path, EventWriter, TransactionWriter};
use super::TRANSACTION_FILE_SUFFIX;
use crate::error::WriteError;
use crate::event::EventRecord;
use crate::transaction::FlushedTransaction;

/// Serializes every JSON file write in the process
static JSON_FILE_LOCK: Mutex<()> = Mutex::new(());

/// Appends events to `<dir>/<YYYY-MM-DD>.json` and transactions to
/// `<dir>/<YYYY-MM-DD>_transactions.json`
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    dir: PathBuf,
}

/// Transaction as persisted, minus events that cannot be formatted
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTransaction<'a> {
    transaction_id: &'a str,
    start_timestamp: &'a DateTime<Local>,
    end_timestamp: &'a DateTime<Local>,
    transaction_logs: Vec<&'a EventRecord>,
}

fn check_event(event: &EventRecord) -> Result<(), WriteError> {
    match event.attributes().first_unsupported() {
        Some((name, value)) => Err(WriteError::unsupported(name, value.type_name())),
        None => Ok(()),
    }
}

impl JsonFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Today's file for single events
    pub fn event_path(&self) -> PathBuf {
        today_file_path(&self.dir, "", "json")
    }

    /// Today's file for transactions
    pub fn transaction_path(&self) -> PathBuf {
        today_file_path(&self.dir, TRANSACTION_FILE_SUFFIX, "json")
    }

    fn append<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), WriteError> {
        let _guard = lock_family(&JSON_FILE_LOCK);
        ensure_dir(&self.dir)?;
        append_element(path, value)
    }
}

impl EventWriter for JsonFileWriter {
    fn write(&self, event: &EventRecord) -> Result<(), WriteError> {
        check_event(event)?;
        self.append(&self.event_path(), event)
    }
}

impl TransactionWriter for JsonFileWriter {
    fn write_transaction(&self, transaction: &FlushedTransaction) -> Result<(), WriteError> {
        let mut first_error = None;
        let mut logs = Vec::with_capacity(transaction.transaction_logs.len());
        for event in &transaction.transaction_logs {
            match check_event(event) {
                Ok(()) => logs.push(event),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        let persisted = PersistedTransaction {
            transaction_id: &transaction.transaction_id,
            start_timestamp: &transaction.start_timestamp,
            end_timestamp: &transaction.end_timestamp,
            transaction_logs: logs,
        };
        self.append(&self.transaction_path(), &persisted)?;

        first_error.map_or(Ok(()), Err)
    }
}
