use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn level_from_cli(cli: &crate::cli::args::Cli) -> tracing::Level {
    if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

/// Console layer plus a per-run file layer (no ANSI). The non-blocking writer
/// serializes interleaved writes from concurrent stages, so log lines stay
/// line-atomic. The returned guard must live for the whole run.
pub fn init(level: tracing::Level, log_file: &Path) -> Result<WorkerGuard> {
    let file = std::fs::File::create(log_file)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("reconpipe={}", level).parse()?)
        .add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(guard)
}
