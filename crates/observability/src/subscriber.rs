//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Safe to call more than once;
/// later calls are no-ops.
pub fn init(default_filter: &str, json: bool) {
    let filter = resolve_filter(std::env::var("RUST_LOG").ok().as_deref(), default_filter);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_ok() {
        tracing::debug!(json, "tracing subscriber installed");
    }
}

/// First parseable directive set among `from_env` and `fallback`, else `info`.
fn resolve_filter(from_env: Option<&str>, fallback: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
