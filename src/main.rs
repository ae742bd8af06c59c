use std::thread;

use anyhow::Result;
use uuid::Uuid;

use txlog::config::{self, Config};
use txlog::diagnostics;
use txlog::retention;
use txlog::{Attributes, Logger, TransactionLoggerBuilder};

fn main() -> Result<()> {
    if let Err(e) = diagnostics::init_diagnostics(diagnostics::DEFAULT_DIRECTIVE) {
        eprintln!("{:#}", e);
    }

    let config = Config::load_or_default();
    let section = &config.logger;
    tracing::info!(
        "Using config {} (level={}, writer={})",
        config::config_file_path().display(),
        section.level(),
        section.output_writer()
    );

    let output_dir = section.output_directory();
    match retention::cleanup_old_logs_with_retention(&output_dir, section.retention_days) {
        Ok(count) if count > 0 => tracing::info!("Cleaned up {} old log files", count),
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to clean up old logs: {:#}", e),
    }

    let logger = Logger::init_global(section, |builder| builder);
    logger.info("txlog demo starting", Attributes::new().with("pid", std::process::id()));
    logger.debug(
        "debug details",
        Attributes::new().with("outputDirectory", output_dir.to_string_lossy().as_ref()),
    );

    let transactions = TransactionLoggerBuilder::from_config(section).build();
    let tx = transactions.transaction(Uuid::new_v4().to_string());
    tx.start()?;

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let tx = tx.clone();
            thread::spawn(move || -> Result<()> {
                for step in 0..3 {
                    tx.info(
                        "processing step",
                        Attributes::new().with("worker", worker).with("step", step),
                    )?;
                }
                tx.warning("worker finished", Attributes::new().with("worker", worker))?;
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => tracing::error!("Worker thread panicked"),
        }
    }

    tx.stop()?;
    logger.info("txlog demo finished", Attributes::new().with("transaction", tx.id()));
    Ok(())
}
