//! Tracing subscriber setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Initialise the global fmt subscriber
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless: the
/// second initialisation is ignored.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
