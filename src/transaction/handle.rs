//! Per-id transaction handles and their factory

use std::sync::Arc;
use std::time::Duration;

use super::{TransactionAggregator, DEFAULT_GRACE_PERIOD};
use crate::config::LoggerSection;
use crate::error::TransactionError;
use crate::event::Attributes;
use crate::level::{passes, Level};
use crate::writer::{ConsoleWriter, TransactionWriter};

/// Handle on one transaction id
///
/// Carries the threshold and writer the transaction is started with. With
/// an `Off` threshold every operation succeeds without touching the
/// registry.
#[derive(Clone)]
pub struct Transaction {
    aggregator: Arc<TransactionAggregator>,
    id: String,
    threshold: Level,
    writer: Arc<dyn TransactionWriter>,
}

impl Transaction {
    pub fn new(
        aggregator: Arc<TransactionAggregator>,
        id: impl Into<String>,
        threshold: Level,
        writer: Arc<dyn TransactionWriter>,
    ) -> Self {
        Self {
            aggregator,
            id: id.into(),
            threshold,
            writer,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn start(&self) -> Result<(), TransactionError> {
        self.aggregator
            .start(&self.id, self.threshold, Arc::clone(&self.writer))
    }

    /// Record an event; `Ok(false)` when the level is filtered out
    pub fn record(
        &self,
        level: Level,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<bool, TransactionError> {
        if !passes(level, self.threshold) {
            return Ok(false);
        }
        self.aggregator.record(&self.id, level, message, attributes)
    }

    pub fn info(
        &self,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<(), TransactionError> {
        self.record(Level::Info, message, attributes).map(|_| ())
    }

    pub fn warning(
        &self,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<(), TransactionError> {
        self.record(Level::Warning, message, attributes).map(|_| ())
    }

    pub fn error(
        &self,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<(), TransactionError> {
        self.record(Level::Error, message, attributes).map(|_| ())
    }

    pub fn debug(
        &self,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Result<(), TransactionError> {
        self.record(Level::Debug, message, attributes).map(|_| ())
    }

    /// End the transaction, blocking for the aggregator's grace period
    pub fn stop(&self) -> Result<(), TransactionError> {
        if self.threshold == Level::Off {
            return Ok(());
        }
        self.aggregator.stop(&self.id)
    }
}

/// Hands out [`Transaction`] handles sharing one threshold, writer and
/// registry
#[derive(Clone)]
pub struct TransactionLogger {
    aggregator: Arc<TransactionAggregator>,
    threshold: Level,
    writer: Arc<dyn TransactionWriter>,
}

impl TransactionLogger {
    /// Builder with default settings (info, console, 5 s grace period)
    pub fn builder() -> TransactionLoggerBuilder {
        TransactionLoggerBuilder::default()
    }

    /// Handle for `id` using this logger's threshold and writer
    pub fn transaction(&self, id: impl Into<String>) -> Transaction {
        Transaction::new(
            Arc::clone(&self.aggregator),
            id,
            self.threshold,
            Arc::clone(&self.writer),
        )
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn aggregator(&self) -> &Arc<TransactionAggregator> {
        &self.aggregator
    }
}

/// Builder for [`TransactionLogger`]
///
/// Seeded from defaults or configuration; each override replaces the value
/// set before it.
pub struct TransactionLoggerBuilder {
    threshold: Level,
    writer: Arc<dyn TransactionWriter>,
    grace_period: Duration,
    aggregator: Option<Arc<TransactionAggregator>>,
}

impl Default for TransactionLoggerBuilder {
    fn default() -> Self {
        Self {
            threshold: Level::Info,
            writer: Arc::new(ConsoleWriter::stdout()),
            grace_period: DEFAULT_GRACE_PERIOD,
            aggregator: None,
        }
    }
}

impl TransactionLoggerBuilder {
    /// Builder seeded from the `[logger]` configuration section
    pub fn from_config(section: &LoggerSection) -> Self {
        Self {
            threshold: section.level(),
            writer: section
                .output_writer()
                .transaction_writer(&section.output_directory()),
            grace_period: section.grace_period(),
            aggregator: None,
        }
    }

    pub fn level(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn writer(mut self, writer: Arc<dyn TransactionWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Grace period of the registry created by `build`
    ///
    /// Ignored when an existing aggregator is supplied.
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Share an existing registry instead of creating one
    pub fn aggregator(mut self, aggregator: Arc<TransactionAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn build(self) -> TransactionLogger {
        let grace_period = self.grace_period;
        TransactionLogger {
            aggregator: self
                .aggregator
                .unwrap_or_else(|| Arc::new(TransactionAggregator::new(grace_period))),
            threshold: self.threshold,
            writer: self.writer,
        }
    }
}
