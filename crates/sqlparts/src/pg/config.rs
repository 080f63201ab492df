use std::time::Duration;
use tracing::Level;

/// Configuration for [`InstrumentedHandle`](super::InstrumentedHandle).
///
/// By default there is no timeout, statements are logged at `DEBUG`, and
/// logged SQL is truncated to 200 bytes.
#[derive(Debug, Clone)]
pub struct HandleConfig {
    /// Query timeout duration. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Tracing event level for executed statements.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl HandleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout duration.
    ///
    /// Queries exceeding this duration are abandoned and fail with a timeout error.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Override the tracing event level.
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
