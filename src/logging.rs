//! Tracing subscriber setup for the command-line binary.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a given `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "ev_roi_sim=info",
        2 => "ev_roi_sim=debug",
        _ => "ev_roi_sim=trace",
    }
}

/// Installs a stderr `fmt` subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
