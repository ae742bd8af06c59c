//! Error types for writers and the transaction aggregator

use std::path::PathBuf;

use thiserror::Error;

/// Failure to render or persist an event or a flushed transaction
#[derive(Error, Debug)]
pub enum WriteError {
    /// An attribute value outside the formattable set (int, float, string)
    #[error("formatting is not implemented for attribute '{name}' of type {type_name}")]
    UnsupportedAttributeType {
        name: String,
        type_name: &'static str,
    },

    /// Opening, seeking, reading or writing a sink file failed
    #[error("could not {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the console target failed
    #[error("could not write to console: {0}")]
    Console(#[source] std::io::Error),

    /// Serializing an entry to JSON failed
    #[error("could not serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A JSON log file could not be parsed back
    #[error("could not parse JSON log file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON log file does not end with the array closing marker
    #[error("{} is not a JSON log array, refusing to append", path.display())]
    MalformedArray { path: PathBuf },
}

impl WriteError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WriteError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported(name: &str, type_name: &'static str) -> Self {
        WriteError::UnsupportedAttributeType {
            name: name.to_string(),
            type_name,
        }
    }
}

/// Protocol and flush failures of the transaction aggregator
#[derive(Error, Debug)]
pub enum TransactionError {
    /// A live transaction already uses this id
    #[error("transaction was already started: {0}")]
    AlreadyStarted(String),

    /// No live transaction uses this id
    #[error("transaction was not started or was recently ended: {0}")]
    NotFound(String),

    /// The transaction ended but its writer failed
    #[error("transaction {id} ended but could not be written: {source}")]
    Write {
        id: String,
        #[source]
        source: WriteError,
    },
}
