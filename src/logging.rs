//! Tracing subscriber setup shared by the server and the admin CLI

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. `RUST_LOG` takes precedence; otherwise
/// `default_level` (from `LOG_LEVEL`) is used, falling back to `info` when
/// it does not parse as a filter directive.
pub fn init(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
