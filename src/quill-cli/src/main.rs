//! Quill CLI - Main entry point.
//!
//! Streams a dialogue transcript through the conversion service and types
//! the narrative result to stdout. Status and logs go to stderr.

use std::fs::File;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use quill_cli::cli::{Cli, run};

/// Environment variable selecting the log level.
const QUILL_LOG_LEVEL_ENV: &str = "QUILL_LOG_LEVEL";

/// File the `--debug` log is written to, in the working directory.
const DEBUG_LOG_FILE: &str = "quill-debug.log";

/// Filter for the quill crates at `level`, everything else at warn.
fn quill_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,quill_cli={level},quill_engine={level},quill_protocol={level}"
    ))
}

/// Install the stderr layer and, with `--debug`, a trace-level file layer.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let env_level = std::env::var(QUILL_LOG_LEVEL_ENV).ok();
    let level = cli.effective_log_level(env_level.as_deref());

    let stderr_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        quill_filter(level.as_filter_str())
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (file_layer, guard) = if cli.debug {
        let path = std::env::current_dir()?.join(DEBUG_LOG_FILE);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(quill_filter("trace"));
        eprintln!("Writing trace log to {}", path.display());
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_logging(&cli)?;

    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quill_filter_covers_every_crate() {
        let filter = quill_filter("trace").to_string();
        for target in ["quill_cli=trace", "quill_engine=trace", "quill_protocol=trace"] {
            assert!(filter.contains(target), "{filter} is missing {target}");
        }
    }
}
