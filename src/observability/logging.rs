//! Tracing subscriber setup.
//!
//! One process-wide subscriber: an env-filterable fmt layer. The DPI audit
//! stream is ordinary tracing events on the `audit` target, so operators
//! can route or silence it with the same filter syntax as everything else
//! (e.g. `RUST_LOG=sfc_router=info,audit=warn`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
