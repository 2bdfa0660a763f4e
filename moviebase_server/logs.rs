use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber: stdout plus a daily rotating file under `logs/`.
///
/// Levels come from `RUST_LOG`, falling back to `info` everywhere and `debug`
/// for the moviebase crates.
pub fn setup_logging() {
    let file_appender = tracing_appender::rolling::daily("logs", "moviebase.log");
    let (non_blocking_file, guard_file) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_thread_ids(true)
        .with_target(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true);

    let default_filter = "info,moviebase=debug,moviebase_app=debug,moviebase_db=debug";

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // The file writer flushes on drop; it must live as long as the process.
    std::mem::forget(guard_file);
}
