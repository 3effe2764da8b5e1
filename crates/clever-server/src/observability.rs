//! Log subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level` when it parses.
pub fn init_tracing(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(log_filter(level))
        .with(fmt::layer().with_target(false))
        .try_init();
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
