use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Filter comes from `RUST_LOG`, then `LOG_LEVEL`, then `default_level`.
/// Output goes to stderr; stdout is reserved for reports.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
