//! Observability: structured logging and metric counters.
//!
//! Logs go to stderr so that command output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this twice is
/// an error.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    metrics::register_core_metrics();
    tracing::debug!("Observability initialized");
    Ok(())
}
