//! Configuration for query-trace logging.

use std::time::Duration;

use tracing::Level;

/// Configuration options for [`TraceLogger`](crate::TraceLogger).
///
/// Every setter overwrites one field, so setters for different fields can be
/// chained in any order and repeating a setter keeps the last value.
///
/// # Example
///
/// ```rust
/// use sea_orm_query_logger::TraceLoggerConfig;
/// use std::time::Duration;
///
/// let config = TraceLoggerConfig::default()
///     .with_ignore_not_found_error(true)
///     .with_slow_threshold(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct TraceLoggerConfig {
    /// Whether query parameters survive [`filter_params`](crate::QueryLogger::filter_params).
    /// Default: `false` (parameters may contain sensitive data)
    pub log_parameters: bool,

    /// Stack level records are attributed to, counted outward from the
    /// logger and `TracedConnection`: `1` is the first frame outside them.
    /// `0` attaches no caller.
    /// Default: `0`
    pub caller_skip_frames: usize,

    /// Level used for a query trace that is neither slow nor failed.
    /// Default: `DEBUG`
    pub default_level: Level,

    /// Field name the SQL text is recorded under.
    /// Default: `"sql"`
    pub sql_field_name: String,

    /// Drop traces whose error is a record-not-found error.
    /// Default: `false`
    pub ignore_not_found_error: bool,

    /// Queries slower than this are logged at WARN.
    /// A zero duration disables slow-query detection.
    /// Default: 500ms
    pub slow_threshold: Duration,

    /// Log every query, not only slow or failed ones.
    /// Default: `false`
    pub log_all: bool,
}

impl Default for TraceLoggerConfig {
    fn default() -> Self {
        Self {
            log_parameters: false,
            caller_skip_frames: 0,
            default_level: Level::DEBUG,
            sql_field_name: "sql".to_string(),
            ignore_not_found_error: false,
            slow_threshold: Duration::from_millis(500),
            log_all: false,
        }
    }
}

impl TraceLoggerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable query parameter logging.
    ///
    /// **Security Warning**: Query parameters often contain user input and
    /// potentially sensitive data. Only enable in development or controlled environments.
    pub fn with_parameter_logging(mut self, enabled: bool) -> Self {
        self.log_parameters = enabled;
        self
    }

    /// Set the stack level records are attributed to; `0` attaches no caller.
    pub fn with_skip_frames(mut self, skip: usize) -> Self {
        self.caller_skip_frames = skip;
        self
    }

    /// Set the level used for ordinary query traces.
    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the field name the SQL text is recorded under.
    pub fn with_sql_field_name(mut self, name: impl Into<String>) -> Self {
        self.sql_field_name = name.into();
        self
    }

    /// Suppress traces for `DbErr::RecordNotFound`, including wrapped ones.
    pub fn with_ignore_not_found_error(mut self, enabled: bool) -> Self {
        self.ignore_not_found_error = enabled;
        self
    }

    /// Set the threshold for slow query warnings.
    ///
    /// Queries taking longer than this duration are logged at WARN level.
    /// `Duration::ZERO` turns slow-query detection off.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Log every query trace at the default level.
    pub fn with_log_all(mut self, enabled: bool) -> Self {
        self.log_all = enabled;
        self
    }

    /// Create a development-friendly configuration with full logging enabled.
    ///
    /// **Warning**: Do not use in production as it logs all SQL and parameters.
    pub fn development() -> Self {
        Self {
            log_parameters: true,
            slow_threshold: Duration::from_millis(100),
            log_all: true,
            ..Self::default()
        }
    }

    /// Create a production-safe configuration that only reports anomalies.
    pub fn production() -> Self {
        Self {
            log_parameters: false,
            slow_threshold: Duration::from_secs(1),
            ignore_not_found_error: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TraceLoggerConfig::default();
        assert!(!config.log_parameters);
        assert_eq!(config.caller_skip_frames, 0);
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.sql_field_name, "sql");
        assert!(!config.ignore_not_found_error);
        assert_eq!(config.slow_threshold, Duration::from_millis(500));
        assert!(!config.log_all);
    }

    #[test]
    fn test_config_builder() {
        let config = TraceLoggerConfig::new()
            .with_parameter_logging(true)
            .with_skip_frames(2)
            .with_default_level(Level::INFO)
            .with_sql_field_name("query")
            .with_ignore_not_found_error(true)
            .with_slow_threshold(Duration::ZERO)
            .with_log_all(true);

        assert!(config.log_parameters);
        assert_eq!(config.caller_skip_frames, 2);
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.sql_field_name, "query");
        assert!(config.ignore_not_found_error);
        assert_eq!(config.slow_threshold, Duration::ZERO);
        assert!(config.log_all);
    }

    #[test]
    fn test_last_setter_wins() {
        let config = TraceLoggerConfig::default()
            .with_sql_field_name("first")
            .with_slow_threshold(Duration::from_secs(3))
            .with_sql_field_name("second");

        assert_eq!(config.sql_field_name, "second");
        assert_eq!(config.slow_threshold, Duration::from_secs(3));
    }

    #[test]
    fn test_development_config() {
        let config = TraceLoggerConfig::development();
        assert!(config.log_parameters);
        assert!(config.log_all);
        assert_eq!(config.slow_threshold, Duration::from_millis(100));
    }

    #[test]
    fn test_production_config() {
        let config = TraceLoggerConfig::production();
        assert!(!config.log_parameters);
        assert!(!config.log_all);
        assert!(config.ignore_not_found_error);
        assert_eq!(config.sql_field_name, "sql");
    }
}
