//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wellspring={}", config.level)))
}

/// Install the global subscriber
///
/// `format = "json"` emits one JSON object per event, anything else uses
/// the human-readable formatter.
pub fn init(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
