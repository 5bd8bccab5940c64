//! Logging and tracing utilities for cani2d
//!
//! Structured logging uses the `tracing` crate. Binaries call
//! [`init_with_config`] once; libraries only emit events and spans.

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize tracing with a custom configuration
///
/// `RUST_LOG` takes precedence over `config.default_level` when set.
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_ok()
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number);

        // A subscriber installed by an embedding application wins.
        let _ = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .try_init();
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default log level filter (e.g., "info", "debug", "warn")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    /// Show thread IDs in log output
    pub show_thread_ids: bool,
    /// Show source file in log output
    pub show_file: bool,
    /// Show line number in log output
    pub show_line_number: bool,
}

impl TracingConfig {
    /// Map a `-v` count onto a filter and detail level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        Self {
            default_level: level.to_string(),
            show_target: verbosity >= 2,
            show_thread_ids: false,
            show_file: verbosity >= 3,
            show_line_number: verbosity >= 3,
        }
    }
}

/// Run one pipeline stage inside a span and log how long it took
pub fn instrument_stage<T, F>(name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let span = tracing::info_span!("stage", stage = %name);
    let _guard = span.enter();

    let start = std::time::Instant::now();
    let result = f();
    let duration = start.elapsed();

    tracing::debug!(duration_us = %duration.as_micros(), "Stage complete");

    result
}
