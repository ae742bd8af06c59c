//! Console sink

use std::io::Write;
use std::sync::Mutex;

use super::format::{render_line, render_transaction};
use super::{EventWriter, TransactionWriter};
use crate::error::WriteError;
use crate::event::EventRecord;
use crate::transaction::FlushedTransaction;

/// Writes rendered lines to stdout or any injected target
pub struct ConsoleWriter {
    target: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleWriter {
    /// Console writer on the process stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Console writer on a custom target
    pub fn new(target: impl Write + Send + 'static) -> Self {
        Self {
            target: Mutex::new(Box::new(target)),
        }
    }

    /// Write a fully rendered chunk in one piece
    fn emit(&self, text: &str) -> Result<(), WriteError> {
        let mut target = self
            .target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        target
            .write_all(text.as_bytes())
            .and_then(|_| target.flush())
            .map_err(WriteError::Console)
    }
}

impl EventWriter for ConsoleWriter {
    fn write(&self, event: &EventRecord) -> Result<(), WriteError> {
        let (line, rendered) = render_line(event);
        self.emit(&line)?;
        rendered
    }
}

impl TransactionWriter for ConsoleWriter {
    fn write_transaction(&self, transaction: &FlushedTransaction) -> Result<(), WriteError> {
        let (block, rendered) = render_transaction(transaction);
        self.emit(&block)?;
        rendered
    }
}
