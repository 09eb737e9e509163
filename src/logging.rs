//! Diagnostic logging to stderr.
//!
//! Filter precedence: `RUST_LOG`, then `[logging].filter`, then `warn`.
//! `--verbose` on the command line raises the fallback to `asknou=debug`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const DEFAULT_FILTER: &str = "warn";
pub const VERBOSE_FILTER: &str = "asknou=debug,warn";

/// Pick the filter directive without consulting `RUST_LOG`.
pub fn fallback_filter(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    match config.filter.as_deref().map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_filter(config, verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
