//! Logging setup for the sidecar binaries.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the default `info` filter.
pub(crate) fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
