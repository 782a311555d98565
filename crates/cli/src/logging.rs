//! Tracing setup: console output plus optional daily JSON log files.

use shanghan_config::LoggingConfig;
use shanghan_gateway::admin::LOG_FILE_PREFIX;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `-v`, which wins over `logging.level`. When
/// `logging.log_dir` is set, events are also written as JSON lines to
/// `<log_dir>/shanghan.log.<date>`; the returned guard flushes that writer
/// and must live until exit.
pub fn init(verbose: bool, logging: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let level = if verbose {
        "debug"
    } else {
        logging.map(|l| l.level.as_str()).unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match logging.and_then(|l| l.log_dir.as_deref()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}
