//! Internal diagnostics via `tracing`
//!
//! The crate reports its own events (sink failures, rotations, retention sweeps)
//! through `tracing`. Applications that do not already install a subscriber can
//! call [`init`] to route those events to stderr.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a stderr subscriber filtered by `RUST_LOG`, or `default_filter` when
/// the variable is unset or invalid
///
/// Returns false if a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
