//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level so a single run can
//! be made noisier without touching the config file.

use slotline_common::CommonError;
use slotline_domain::{LoggingConfig, Result, SlotlineError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the filter for `config`, preferring `RUST_LOG` when it is set
///
/// # Errors
/// Returns a `CommonError::Config` if the configured level is not a valid
/// filter directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        SlotlineError::Common(CommonError::config_field(
            "logging.level",
            format!("invalid filter '{}': {e}", config.level),
        ))
    })
}

/// Install the global tracing subscriber
///
/// Emits JSON lines when `config.json` is set, human-readable output
/// otherwise. Returns `Ok(false)` if a subscriber was already installed.
///
/// # Errors
/// Returns a `CommonError::Config` if the configured level is invalid.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    }
    .is_ok();

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    }
    Ok(installed)
}
