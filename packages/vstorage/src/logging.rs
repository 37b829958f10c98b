//! Log output for binaries embedding a storage tree.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the application.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter from `RUST_LOG`, or `default_level` when it is unset or invalid.
pub fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()))
}

/// Install a stderr formatter honoring `RUST_LOG`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init(default_level: Level) {
    let registry = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_writer(std::io::stderr));

    if registry.try_init().is_err() {
        tracing::debug!("a global subscriber is already installed");
    }
}
