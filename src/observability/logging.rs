//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber once at process start
//! - Honour `RUST_LOG`, falling back to the configured level
//!
//! Components log through their own `Span` (see `ConfigGate` and
//! `RedirectEngine`) so embedding code can filter per component.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("web_frontend={level},tower_http={level}")
}

/// Install the fmt subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if let Err(e) = result {
        tracing::debug!(error = %e, "Logging already initialised");
    }
}
