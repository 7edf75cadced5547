use anyhow::{Result, anyhow};
use stratum_core::{EngineConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Level used before the config is known, when `RUST_LOG` is unset.
const BOOTSTRAP_LEVEL: &str = "warn";

/// Subscriber for the config-loading phase: `RUST_LOG` if set, otherwise warnings.
///
/// Installed with `tracing::subscriber::set_default` so it is replaced once
/// [`init`] installs the configured global subscriber.
pub fn bootstrap() -> impl tracing::Subscriber + Send + Sync {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), BOOTSTRAP_LEVEL)
        .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}

/// Installs the global subscriber: `RUST_LOG` if set, otherwise the configured level.
pub fn init(config: &EngineConfig) -> Result<()> {
    let filter = env_filter(
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        &config.log_level,
    )?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// `rust_log` wins when it parses; otherwise `fallback` must.
fn env_filter(rust_log: Option<&str>, fallback: &str) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(fallback).map_err(|e| anyhow!("Invalid log_level '{}': {}", fallback, e))
}
