//! Task logging
//!
//! Diagnostics go to stderr so stdout stays free for `##vso[...]` logging
//! commands. `RUST_LOG` takes precedence over the default level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a run with the given debug setting
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Initialize the tracing subscriber.
///
/// `debug` mirrors `SYSTEM_DEBUG=true` on the pipeline.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
