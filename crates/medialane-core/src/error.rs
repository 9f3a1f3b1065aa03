//! Error types module
//!
//! Top-level error type for Medialane components. The resolution, cache and
//! cascade paths absorb their own failures (a guaranteed-renderable default is
//! the worst outcome); `AppError` covers what is left: configuration, bad
//! input and wiring failures surfaced to binaries.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad user input
    Debug,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logging and CLI output
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONFIG_ERROR")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: format!("{:#}", err),
            source: err,
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) => LogLevel::Debug,
            AppError::Config(_) | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

impl AppError {
    /// Emit this error through `tracing` at its own log level.
    pub fn log(&self) {
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(code = self.error_code(), error = %self),
            LogLevel::Error => tracing::error!(code = self.error_code(), error = %self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_logs_at_debug() {
        let err = AppError::InvalidInput("Provide --value or --file".into());
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn config_errors_log_at_error() {
        let err = AppError::Config("MEDIALANE_CACHE_DIR not configured".into());
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn anyhow_keeps_source_and_context() {
        let err: AppError = anyhow::anyhow!("disk gone")
            .context("Failed to create durable cache tier")
            .into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(err.to_string().contains("disk gone"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
