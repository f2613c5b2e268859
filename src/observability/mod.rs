//! Tracing setup
//!
//! Library code only emits `tracing` events. Binaries, examples and tests that want
//! to see them call `init_tracing` once; later calls are no-ops.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directive (`info`, `siumai_relay=debug`, ...). `RUST_LOG` wins when set.
    pub filter: String,
    /// Emit JSON lines instead of the compact console format.
    pub json: bool,
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            with_target: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install a global subscriber. Returns `false` if one was already installed.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let installed = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(config.with_target),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.with_target),
            )
            .try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installing a global subscriber here would race with `#[traced_test]` elsewhere,
    // so only the configuration is exercised.
    #[test]
    fn invalid_directive_falls_back_to_info() {
        let config = TracingConfig::new().with_filter("[[not a filter");
        let filter = config.env_filter();
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn builder_sets_fields() {
        let config = TracingConfig::new()
            .with_filter("siumai_relay=debug")
            .with_json(true)
            .with_target(true);
        assert_eq!(config.filter, "siumai_relay=debug");
        assert!(config.json && config.with_target);
    }
}
