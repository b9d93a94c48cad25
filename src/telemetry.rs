//! Telemetry logic.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging for the whole process.
///
/// Filtering is driven by `RUST_LOG`; defaults to `info` for this crate.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,folio=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
