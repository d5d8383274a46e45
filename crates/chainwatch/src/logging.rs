//! Tracing initialisation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialises a global `tracing` subscriber at the given level.
///
/// The level accepts full env-filter directives
/// (`"info,chainwatch_rpc=debug"`). Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
