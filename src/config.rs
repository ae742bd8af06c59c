//! Configuration for txlog
//!
//! Read once at startup from a TOML file and handed to the loggers as an
//! immutable value. A missing file yields defaults; unknown level or writer
//! names resolve to `info` and `cli`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::writer::OutputWriterKind;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "TXLOG_CONFIG_PATH";

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerSection,
}

/// The `[logger]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerSection {
    /// Threshold: "off", "info", "warning", "error" or "debug"
    #[serde(default = "default_level")]
    pub level: String,

    /// Sink: "cli", "jsonFile" or "textFile"
    #[serde(default = "default_output_writer")]
    pub output_writer: String,

    /// Directory for per-day log files (`~` is expanded)
    #[serde(default = "default_output_directory")]
    pub output_directory: String,

    /// How long `stop` waits before flushing a transaction (default: 5000)
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Per-day files older than this many days are pruned (default: 7)
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_level() -> String {
    Level::Info.as_str().to_string()
}

fn default_output_writer() -> String {
    OutputWriterKind::Cli.as_str().to_string()
}

fn default_output_directory() -> String {
    logs_dir().to_string_lossy().into_owned()
}

fn default_grace_period_ms() -> u64 {
    5_000
}

fn default_retention_days() -> u64 {
    7
}

impl Default for LoggerSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            output_writer: default_output_writer(),
            output_directory: default_output_directory(),
            grace_period_ms: default_grace_period_ms(),
            retention_days: default_retention_days(),
        }
    }
}

impl LoggerSection {
    /// Resolved threshold
    pub fn level(&self) -> Level {
        Level::from_config(&self.level)
    }

    /// Resolved sink kind
    pub fn output_writer(&self) -> OutputWriterKind {
        OutputWriterKind::from_config(&self.output_writer)
    }

    /// Output directory with `~` expanded
    pub fn output_directory(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output_directory).into_owned())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Config {
    /// Load configuration from the configured path, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file, or defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration, recovering from any failure with defaults
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Logger configuration unavailable, using defaults: {:#}", e);
            Self::default()
        })
    }
}

/// Get the base configuration directory (~/.txlog)
/// Falls back to ./.txlog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".txlog"))
        .unwrap_or_else(|| {
            tracing::warn!("Could not determine home directory, using current directory for config");
            PathBuf::from(".txlog")
        })
}

/// Get the path to the config file, honoring `TXLOG_CONFIG_PATH`
pub fn config_file_path() -> PathBuf {
    resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok())
}

fn resolve_config_path(from_env: Option<String>) -> PathBuf {
    match from_env {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.toml"),
    }
}

/// Get the default directory for log files
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}
