//! Diagnostic logging for the command-line tool.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Diagnostics go to stderr so stdout stays clean for diffs
//! and query results.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` for
/// this crate when `verbose` is on.
pub fn init(verbose: bool) {
    let default = if verbose { "warn,tree_patcher=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
