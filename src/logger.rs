use snafu::ResultExt;
use tracing::Metadata;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{registry, EnvFilter, Layer};

use crate::config::Config;
use crate::error::{ApplicationError, InitializeLoggerSnafu};

const LOG_FILE: &str = "tally.log";

/// Used when `RUST_LOG` is unset or can't be parsed.
const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the global subscriber.
///
/// Everything that passes `RUST_LOG` goes to stdout. The daily JSON file under
/// `config.log_dir` only receives this crate's own events and the request
/// spans, so dependency chatter stays on the console. The returned guard
/// flushes the file writer when dropped.
pub fn init(config: &Config) -> Result<WorkerGuard, ApplicationError> {
    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = layer()
        .json()
        .with_ansi(false)
        .with_current_span(true)
        .with_writer(writer)
        .with_filter(filter_fn(recorded_in_file));

    let console_layer = layer().pretty().with_writer(std::io::stdout);

    registry()
        .with(env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context(InitializeLoggerSnafu)?;

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

fn recorded_in_file(metadata: &Metadata<'_>) -> bool {
    let target = metadata.target();
    target.starts_with(env!("CARGO_CRATE_NAME")) || target.starts_with("tower_http")
}
