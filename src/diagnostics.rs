//! Internal diagnostics through `tracing`
//!
//! The library reports its own failures (unwritable files, a missing
//! config) as `tracing` events. This installs a stderr subscriber for
//! them; embedding applications with their own subscriber skip it.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "txlog=info";

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_diagnostics(default_directive: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install diagnostics subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        // At most one install succeeds per process.
        let first = init_diagnostics(DEFAULT_DIRECTIVE);
        let second = init_diagnostics(DEFAULT_DIRECTIVE);
        assert!(second.is_err());
        if let Err(e) = first {
            assert!(e.to_string().contains("diagnostics subscriber"));
        }
    }
}
