use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "DS_LOG";

/// Initialize a tracing subscriber that writes to stderr.
///
/// The filter is read from `DS_LOG`, defaulting to "debug" with `verbose`
/// and "warn" otherwise. Stdout carries results only.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let default = if verbose { "debug" } else { "warn" };
    let filter_layer = EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
