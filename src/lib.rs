//! txlog - Leveled event logging with transaction aggregation
//!
//! A [`Logger`] writes single events, gated by a threshold, to one sink.
//! A [`TransactionLogger`] buffers the events of each transaction id from
//! start to stop and writes them as one unit, so a transaction's events
//! stay together no matter how many threads record into it. Sinks are the
//! console, per-day text files, per-day JSON array files and an in-memory
//! buffer.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod level;
pub mod logger;
pub mod retention;
pub mod transaction;
pub mod writer;

pub use config::{Config, LoggerSection};
pub use error::{TransactionError, WriteError};
pub use event::{AttributeValue, Attributes, EventRecord};
pub use level::Level;
pub use logger::{Logger, LoggerBuilder};
pub use transaction::{
    FlushedTransaction, Transaction, TransactionAggregator, TransactionLogger,
    TransactionLoggerBuilder,
};
pub use writer::{
    ConsoleWriter, EventWriter, JsonFileWriter, MemoryWriter, OutputWriterKind, TextFileWriter,
    TransactionWriter,
};
