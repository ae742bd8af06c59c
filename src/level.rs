//! Severity levels and the gating rule
//!
//! Levels are ordered by verbosity: `Off < Info < Warning < Error < Debug`.
//! A threshold records every level at or below its own rank, and `Off`
//! records nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a logged event, or the threshold a logger records up to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Off,
    #[default]
    Info,
    Warning,
    Error,
    Debug,
}

impl Level {
    /// All levels in rank order
    pub const ALL: [Level; 5] = [
        Level::Off,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Debug,
    ];

    /// Numeric rank, 0 for `Off` up to 4 for `Debug`
    pub fn rank(self) -> u8 {
        match self {
            Level::Off => 0,
            Level::Info => 1,
            Level::Warning => 2,
            Level::Error => 3,
            Level::Debug => 4,
        }
    }

    /// Get the lowercase name used in rendered and persisted output
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Off => "off",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    /// Whether an event at this level is recorded under `threshold`
    pub fn passes(self, threshold: Level) -> bool {
        passes(self, threshold)
    }

    /// Resolve a configuration value, falling back to `Info`
    ///
    /// Unknown or empty values never fail startup; they are reported and
    /// replaced by the default.
    pub fn from_config(value: &str) -> Self {
        match value.parse() {
            Ok(level) => level,
            Err(e) => {
                if !value.trim().is_empty() {
                    tracing::warn!("{}, using {}", e, Level::Info);
                }
                Level::Info
            }
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown logger level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Level::Off),
            "info" => Ok(Level::Info),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "debug" => Ok(Level::Debug),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Gating predicate shared by every logger and transaction
pub fn passes(event_level: Level, threshold: Level) -> bool {
    threshold != Level::Off && event_level.rank() <= threshold.rank()
}
