//! Structured logging.
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` and either a
//! human-readable or a JSON formatter. JSON lines carry:
//! - `timestamp`, `level`, `target`
//! - the current span and its fields (`book_id`, `draft`, `operation`)
//! - the event message and fields
//!
//! Sensitive rights fields never reach the logger: call sites log ciphertext
//! length and digest only.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Handle returned once the global subscriber is installed.
#[derive(Debug)]
pub struct LoggingHandle {
    /// Whether the JSON formatter is active.
    pub json: bool,
}

/// Install the global subscriber described by `config`.
///
/// Fails with `TelemetryError::LoggingInit` if the filter directive does
/// not parse or a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingHandle, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log filter {:?}: {}", config.log_level, e)))?;

    let json_layer = (config.console_output && config.json_logs).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_thread_ids(true)
    });

    let pretty_layer = (config.console_output && !config.json_logs).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );

    Ok(LoggingHandle {
        json: config.json_logs,
    })
}

/// Log a record-scoped event with the standard `book_id` field.
///
/// ```rust,ignore
/// log_record_event!(info, "Rights unlocked", book_id, outcome = "unlocked");
/// ```
#[macro_export]
macro_rules! log_record_event {
    ($level:ident, $msg:expr, $book_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            book_id = %$book_id,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = TelemetryConfig::default().with_log_level("book_rights=verbose");
        let result = init_logging(&config);
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_record_event_macro_expands() {
        let book_id = "42";
        log_record_event!(debug, "macro smoke test", book_id, outcome = "ok");
    }
}
