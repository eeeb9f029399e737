//! Log subscriber setup for native shells and tests.
//!
//! The core only emits `tracing` events; installing a subscriber is left to
//! the host. Mobile and web shells usually bring their own, so this is opt-in.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Resolves the filter: explicit directive first, then `RUST_LOG`, then `info`.
fn resolve_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a compact stderr subscriber.
///
/// Returns `false` if a global subscriber was already set; the call is then a
/// no-op, so calling it from every test is fine.
pub fn init_logging(directive: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(resolve_filter(directive))
        .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
