//! Tracing initialization.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a single fmt layer. The filter
//! defaults to `info` and can be overridden with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=authgate=debug,tower_http=debug authgate -f config.yaml
//! ```
//!
//! The fmt layer is human-readable by default. Set `log_format: json` in the config file for one
//! JSON object per line, suitable for log shippers.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;

/// Initialize the global tracing subscriber.
///
/// Fails if a global subscriber has already been set.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
    }

    info!("Telemetry initialized ({:?} logs)", format);
    Ok(())
}
