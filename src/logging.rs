//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging long-running saga
//! executions. Initialization is idempotent; the engine never fails
//! because of logging.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-driven configuration.
///
/// - `SAGA_LOG` sets the filter (standard `EnvFilter` syntax, default
///   `info`)
/// - `SAGA_LOG_FORMAT=json` switches the output to JSON lines
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = std::env::var("SAGA_LOG").unwrap_or_else(|_| "info".to_string());
        let json_output = std::env::var("SAGA_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json_output {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(filter))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(filter))
                .boxed()
        };

        // A subscriber may already be installed (tests, embedding app);
        // that is not an error.
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
