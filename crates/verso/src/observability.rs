//! Log output setup.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use verso_error::{ConfigError, ConfigErrorKind, VersoResult};
use verso_variants::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. With `config.json` set,
/// every event is written as one JSON object per line.
///
/// # Errors
///
/// Returns a configuration error if the level is not a valid filter
/// directive or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> VersoResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            ConfigError::new(ConfigErrorKind::LogLevel {
                level: config.level.clone(),
                detail: e.to_string(),
            })
        })?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(ConfigErrorKind::LoggingInstalled(e.to_string())))?;

    Ok(())
}
