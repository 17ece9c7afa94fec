//! Initializes the process-wide `tracing` subscriber: an `RUST_LOG`-driven
//! filter over plain-text output, matching the teacher's `cli::logging`
//! initializer (`cli/src/logging.rs`) minus its span-id text formatter,
//! which this CLI has no distributed-tracing need for.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).finish().try_init();
}
