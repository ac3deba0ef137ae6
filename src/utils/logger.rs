use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("physician_locator=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("physician_locator=info,warn"))
    }
}

/// File name of the per-run log, e.g. `physician-locator-20240101T120000.log`.
pub fn run_log_file_name(started_at: chrono::DateTime<chrono::Local>) -> String {
    format!("physician-locator-{}.log", started_at.format("%Y%m%dT%H%M%S"))
}

/// Console output plus an append-only plain-text log for this run.
///
/// The returned guard flushes the file writer on drop and must be held until exit.
pub fn init_cli_logger(verbose: bool, log_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender =
        tracing_appender::rolling::never(log_dir, run_log_file_name(chrono::Local::now()));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}
