//! In-memory sink
//!
//! Keeps the most recent events and flushed transactions in bounded ring
//! buffers, for embedding applications that display logs themselves.

use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{EventWriter, TransactionWriter};
use crate::error::WriteError;
use crate::event::EventRecord;
use crate::transaction::FlushedTransaction;

/// Thread-safe ring buffers of events and transactions
pub struct MemoryWriter {
    /// Single events (capped at max_events)
    events: RwLock<VecDeque<EventRecord>>,
    /// Flushed transactions (capped at max_transactions)
    transactions: RwLock<VecDeque<FlushedTransaction>>,
    max_events: usize,
    max_transactions: usize,
}

impl MemoryWriter {
    /// Create a writer with the given capacities
    pub fn new(max_events: usize, max_transactions: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(max_events)),
            transactions: RwLock::new(VecDeque::with_capacity(max_transactions)),
            max_events,
            max_transactions,
        }
    }

    /// Snapshot of the buffered events, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        read_buffer(&self.events).iter().cloned().collect()
    }

    /// Snapshot of the buffered transactions, oldest first
    pub fn transactions(&self) -> Vec<FlushedTransaction> {
        read_buffer(&self.transactions).iter().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        read_buffer(&self.events).len()
    }

    pub fn transaction_count(&self) -> usize {
        read_buffer(&self.transactions).len()
    }

    pub fn clear(&self) {
        write_buffer(&self.events).clear();
        write_buffer(&self.transactions).clear();
    }
}

impl Default for MemoryWriter {
    fn default() -> Self {
        Self::new(10_000, 100)
    }
}

// A buffer is a plain queue; a panic while it was locked leaves it usable.
fn read_buffer<T>(buffer: &RwLock<VecDeque<T>>) -> RwLockReadGuard<'_, VecDeque<T>> {
    buffer.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_buffer<T>(buffer: &RwLock<VecDeque<T>>) -> RwLockWriteGuard<'_, VecDeque<T>> {
    buffer.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn push_bounded<T>(buffer: &RwLock<VecDeque<T>>, max: usize, item: T) {
    if max == 0 {
        return;
    }
    let mut buffer = write_buffer(buffer);
    if buffer.len() >= max {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

impl EventWriter for MemoryWriter {
    fn write(&self, event: &EventRecord) -> Result<(), WriteError> {
        if let Some((name, value)) = event.attributes().first_unsupported() {
            return Err(WriteError::unsupported(name, value.type_name()));
        }
        push_bounded(&self.events, self.max_events, event.clone());
        Ok(())
    }
}

impl TransactionWriter for MemoryWriter {
    fn write_transaction(&self, transaction: &FlushedTransaction) -> Result<(), WriteError> {
        let mut first_error = None;
        let mut kept = transaction.clone();
        kept.transaction_logs.retain(|event| {
            match event.attributes().first_unsupported() {
                Some((name, value)) => {
                    first_error.get_or_insert(WriteError::unsupported(name, value.type_name()));
                    false
                }
                None => true,
            }
        });

        push_bounded(&self.transactions, self.max_transactions, kept);
        first_error.map_or(Ok(()), Err)
    }
}
