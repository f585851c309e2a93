//! Logging infrastructure for mesoplan.
//!
//! The library only emits `tracing` events; whatever embeds it installs a
//! subscriber once, usually through [`init_from_config`]. The default
//! filter keeps this crate at the requested level and the HTTP stack
//! (reqwest, hyper, rustls) at `warn`.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at INFO for this crate
pub fn init() {
    init_with_level("info")
}

/// Initialize logging from the `[logging]` config section
pub fn init_from_config(config: &LoggingConfig) {
    init_with_level(&config.level)
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Level for meso_core events (debug, info, warn, error)
///
/// RUST_LOG, when set, replaces the default filter entirely. Calling this
/// after a subscriber is installed is a no-op.
pub fn init_with_level(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn default_directives(level: &str) -> String {
    format!("warn,meso_core={}", level.trim())
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(default_directives("debug")))
        .try_init();
}
