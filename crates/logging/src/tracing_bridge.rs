//! Installation of the global `tracing` subscriber.
//!
//! Events are filtered per target using the directives produced by
//! [`VerbosityConfig::directives`]. A `RUST_LOG` value in the environment
//! replaces those directives entirely.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::VerbosityConfig;

/// Builds the filter for `config`, preferring `RUST_LOG` when it is set and valid.
#[must_use]
pub fn build_filter(config: &VerbosityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()))
}

/// Installs a subscriber that writes formatted events to standard error.
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), TryInitError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt_layer)
        .try_init()
}
