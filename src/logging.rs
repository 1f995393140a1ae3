//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Initialize a tracing subscriber. Uses `RUST_LOG` for filtering if present,
/// `info` otherwise. Safe to call more than once.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
