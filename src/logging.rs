//! Structured logging configuration
//!
//! Diagnostics always go to stderr or a log file so stdout stays free for parse
//! output. Configured through the `[logging]` section:
//!
//! - `format`: `pretty` for terminals, `json` for machine consumption
//! - `output`: `console`, `file` (daily rolling file in the log directory) or `both`
//!
//! Every parse call runs inside a [`parse_span`] carrying a fresh run id.

use crate::config::LoggingConfig;
use crate::parser::FileFormat;
use std::path::Path;
use tracing::Span;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

const LOG_FILE_NAME: &str = "scrobble-parse.log";

/// Install the global subscriber described by `config`.
///
/// File output is written on a background thread; keep the returned guard alive
/// until the program exits or buffered lines are lost. Calling this twice keeps the
/// first subscriber.
pub fn init_logging(config: &LoggingConfig, log_directory: &Path) -> Option<WorkerGuard> {
    // RUST_LOG wins over the configured level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.format == "json";

    match config.output.as_str() {
        "file" => Some(init_file_logging(env_filter, json, log_directory, false)),
        "both" => Some(init_file_logging(env_filter, json, log_directory, true)),
        _ => {
            init_console_logging(env_filter, json);
            None
        }
    }
}

fn init_console_logging(filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(filter);

    let _ = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .pretty(),
            )
            .try_init()
    };
}

fn file_writer(log_dir: &Path) -> (NonBlocking, WorkerGuard) {
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME))
}

fn init_file_logging(filter: EnvFilter, json: bool, log_dir: &Path, echo: bool) -> WorkerGuard {
    let (writer, guard) = file_writer(log_dir);
    let registry = tracing_subscriber::registry().with(filter);

    // A `None` layer is a no-op
    let _ = if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(writer))
            .with(echo.then(|| fmt::layer().json().with_writer(std::io::stderr)))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .with(echo.then(|| fmt::layer().pretty().with_writer(std::io::stderr)))
            .try_init()
    };

    guard
}

/// Span wrapping one parse call.
pub fn parse_span(format: FileFormat, file: &Path) -> Span {
    tracing::info_span!(
        "parse_file",
        format = format.name(),
        file = %file.display(),
        run_id = %Uuid::new_v4()
    )
}

