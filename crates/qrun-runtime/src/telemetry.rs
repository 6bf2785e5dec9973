//! Tracing subscriber setup.
//!
//! - Console output (development)
//! - JSON structured logging (production)

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output (for development).
    Console,
    /// JSON structured logging (for production).
    Json,
}

impl TracingFormat {
    /// Anything other than `"json"` is console output.
    pub fn parse(format: &str) -> Self {
        match format {
            "json" => TracingFormat::Json,
            _ => TracingFormat::Console,
        }
    }
}

/// Build the level filter. `RUST_LOG` wins over the configured level when
/// set, so individual modules can be turned up without editing config.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber described by `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> RuntimeResult<()> {
    let filter = env_filter(&config.level);

    let fmt_layer = match TracingFormat::parse(&config.format) {
        TracingFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .compact()
            .boxed(),
        TracingFormat::Json => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))?;

    tracing::debug!("Tracing initialized ({} format)", config.format);
    Ok(())
}
