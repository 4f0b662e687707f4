//! Tracing subscriber setup for hosts that do not install their own.
//!
//! The engine itself only emits `tracing` events; a host that already has a
//! subscriber should skip this module.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::{RagError, Result};

/// Build the filter: `RUST_LOG` if set, otherwise `default_filter`.
fn env_filter(default_filter: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| RagError::ConfigError(format!("invalid log filter '{default_filter}': {e}"))),
    }
}

/// Install a human-readable global subscriber.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_filter)?)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| RagError::ConfigError(format!("failed to install tracing subscriber: {e}")))
}

/// Install a JSON-lines global subscriber.
///
/// # Errors
///
/// Same as [`init_tracing`].
pub fn init_json_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_filter)?)
        .with(fmt::layer().json().with_current_span(false))
        .try_init()
        .map_err(|e| RagError::ConfigError(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        // The first call may lose to another test's subscriber; either way the
        // second one must fail cleanly.
        let _ = init_tracing("rag_context=debug");
        assert!(init_json_tracing("rag_context=debug").is_err());
    }
}
