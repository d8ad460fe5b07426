//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber, honoring `RUST_LOG`.
///
/// A no-op when a subscriber is already installed, so embedding applications
/// keep control of their own telemetry.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
