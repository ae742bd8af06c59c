//! Transaction-scoped log aggregation
//!
//! A transaction buffers events under an id between `start` and `stop` and
//! is flushed to its writer as one unit. All live transactions sit in one
//! registry behind a single mutex; `start`, every appended event and the
//! removal in `stop` are serialized through it, so concurrent `record`
//! calls on one id never lose an event.
//!
//! `stop` waits a grace period before removing the entry, to let `record`
//! calls racing the stop land. The wait blocks the calling thread. A
//! `record` issued after the removal fails with
//! [`TransactionError::NotFound`].

mod handle;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::TransactionError;
use crate::event::{Attributes, EventRecord};
use crate::level::{passes, Level};
use crate::writer::TransactionWriter;

pub use handle::{Transaction, TransactionLogger, TransactionLoggerBuilder};

/// Grace period used when none is configured
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A transaction as handed to its writer on stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushedTransaction {
    pub transaction_id: String,
    pub start_timestamp: DateTime<Local>,
    pub end_timestamp: DateTime<Local>,
    pub transaction_logs: Vec<EventRecord>,
}

/// Registry entry of a live transaction
struct ActiveTransaction {
    threshold: Level,
    writer: Arc<dyn TransactionWriter>,
    started_at: DateTime<Local>,
    events: Vec<EventRecord>,
}

/// Registry of in-flight transactions
pub struct TransactionAggregator {
    registry: Mutex<HashMap<String, ActiveTransaction>>,
    grace_period: Duration,
}

impl TransactionAggregator {
    /// Create an empty registry whose `stop` waits `grace_period`
    pub fn new(grace_period: Duration) -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Lock the registry
    ///
    /// Nothing panics while the lock is held, so a poisoned registry is
    /// still consistent.
    fn registry(&self) -> MutexGuard<'_, HashMap<String, ActiveTransaction>> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin a transaction under `id`
    ///
    /// An `Off` threshold creates nothing and succeeds. Fails with
    /// `AlreadyStarted` while another transaction with the same id is live;
    /// that transaction is left untouched.
    pub fn start(
        &self,
        id: &str,
        threshold: Level,
        writer: Arc<dyn TransactionWriter>,
    ) -> Result<(), TransactionError> {
        if threshold == Level::Off {
            return Ok(());
        }

        match self.registry().entry(id.to_string()) {
            Entry::Occupied(_) => Err(TransactionError::AlreadyStarted(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(ActiveTransaction {
                    threshold,
                    writer,
                    started_at: Local::now(),
                    events: Vec::new(),
                });
                tracing::debug!("Started transaction {} at level {}", id, threshold);
                Ok(())
            }
        }
    }

    /// Append an event to the live transaction `id`
    ///
    /// Returns `Ok(false)` when the level does not pass the transaction's
    /// threshold. The event is stamped while the registry lock is held, so
    /// timestamps follow append order.
    pub fn record(
        &self,
        id: &str,
        level: Level,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<bool, TransactionError> {
        let mut registry = self.registry();
        let transaction = registry
            .get_mut(id)
            .ok_or_else(|| TransactionError::NotFound(id.to_string()))?;

        if !passes(level, transaction.threshold) {
            return Ok(false);
        }

        transaction
            .events
            .push(EventRecord::new(level, message, attributes));
        Ok(true)
    }

    /// End the transaction `id` and flush it
    ///
    /// Blocks for the grace period, removes the entry and hands the events
    /// to the transaction's writer exactly once. A writer failure is
    /// returned as `TransactionError::Write`; the transaction stays ended.
    pub fn stop(&self, id: &str) -> Result<(), TransactionError> {
        if !self.grace_period.is_zero() {
            tracing::info!(
                "Will end logging transaction {} in {:?}",
                id,
                self.grace_period
            );
            thread::sleep(self.grace_period);
        }

        let transaction = self
            .registry()
            .remove(id)
            .ok_or_else(|| TransactionError::NotFound(id.to_string()))?;

        let flushed = FlushedTransaction {
            transaction_id: id.to_string(),
            start_timestamp: transaction.started_at,
            end_timestamp: Local::now(),
            transaction_logs: transaction.events,
        };

        tracing::debug!(
            "Flushing transaction {} with {} events",
            id,
            flushed.transaction_logs.len()
        );

        transaction
            .writer
            .write_transaction(&flushed)
            .map_err(|source| {
                tracing::warn!("Failed to write transaction {}: {}", id, source);
                TransactionError::Write {
                    id: id.to_string(),
                    source,
                }
            })
    }

    /// Whether a transaction with this id is live
    pub fn is_active(&self, id: &str) -> bool {
        self.registry().contains_key(id)
    }

    /// Number of events buffered so far for a live transaction
    pub fn event_count(&self, id: &str) -> Option<usize> {
        self.registry().get(id).map(|t| t.events.len())
    }

    /// Ids of all live transactions, sorted
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TransactionAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
