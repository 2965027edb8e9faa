// ============================================================================
// Logging Configuration
// ============================================================================

/// Output format of the fmt layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// EnvFilter directive (RUST_LOG)
    pub rust_log: String,
    pub format: LogFormat,
    /// Include message content in debug logs. Off by default.
    pub log_message_content: bool,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> Self {
        let format = match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            format,
            log_message_content: std::env::var("LOG_MESSAGE_CONTENT")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}
