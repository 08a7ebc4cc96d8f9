//! Query trace logger.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use sea_orm::{DbErr, Value};
use tracing::Level;

use crate::caller;
use crate::config::TraceLoggerConfig;
use crate::context::LogContext;
use crate::sink::LogRecord;

/// Field the elapsed query time is recorded under, in milliseconds.
pub const ELAPSED_FIELD: &str = "elapsed_ms";

/// Field the affected row count is recorded under.
pub const ROWS_AFFECTED_FIELD: &str = "rows_affected";

/// Logging contract a database layer drives.
///
/// [`TracedConnection`](crate::TracedConnection) calls [`trace`](Self::trace)
/// once per completed statement and [`filter_params`](Self::filter_params)
/// before rendering statement parameters.
pub trait QueryLogger: Send + Sync {
    /// Return a logger at `level`.
    fn set_level(self: Arc<Self>, level: Level) -> Arc<dyn QueryLogger>;

    fn error(&self, ctx: &LogContext, args: fmt::Arguments<'_>);

    fn warn(&self, ctx: &LogContext, args: fmt::Arguments<'_>);

    fn info(&self, ctx: &LogContext, args: fmt::Arguments<'_>);

    /// Report a completed statement that started at `begin`.
    ///
    /// `result` yields the SQL text and the affected row count (`-1` when
    /// unknown). It is only called when the trace is actually emitted.
    fn trace(
        &self,
        ctx: &LogContext,
        begin: Instant,
        result: &dyn Fn() -> (String, i64),
        err: Option<&(dyn Error + 'static)>,
    );

    /// Decide which statement parameters may be logged.
    fn filter_params<'a>(
        &self,
        ctx: &LogContext,
        sql: &'a str,
        params: &'a [Value],
    ) -> (&'a str, &'a [Value]);
}

/// Whether `err`, or any error in its source chain, is `DbErr::RecordNotFound`.
pub fn is_record_not_found(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(DbErr::RecordNotFound(_)) = err.downcast_ref::<DbErr>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// [`QueryLogger`] that writes structured records to the sink bound to each
/// call's [`LogContext`].
///
/// By default only slow (WARN) and failed (ERROR) statements are logged.
/// The logger is immutable after construction and can be shared freely
/// across threads; clones share one configuration.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use sea_orm_query_logger::{JsonSink, LogContext, QueryLogger, TraceLogger, TraceLoggerConfig};
///
/// let logger = TraceLogger::new(
///     TraceLoggerConfig::default().with_slow_threshold(Duration::from_millis(100)),
/// );
/// let ctx = LogContext::with_sink(JsonSink::new(std::io::stderr()));
///
/// logger.info(&ctx, format_args!("connected to {}", "primary"));
/// logger.trace(&ctx, Instant::now(), &|| ("SELECT 1".to_string(), 1), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraceLogger {
    config: Arc<TraceLoggerConfig>,
}

impl TraceLogger {
    pub fn new(config: TraceLoggerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the logger configuration.
    pub fn config(&self) -> &TraceLoggerConfig {
        &self.config
    }

    fn start(&self, level: Level) -> LogRecord<'_> {
        let record = LogRecord::new(level);
        match caller::resolve(self.config.caller_skip_frames) {
            Some(caller) => record.caller(caller),
            None => record,
        }
    }

    fn log(&self, ctx: &LogContext, level: Level, args: fmt::Arguments<'_>) {
        let sink = ctx.sink();
        if !sink.enabled(level) {
            return;
        }
        sink.send(&self.start(level).msg(args.to_string()));
    }
}

impl From<TraceLoggerConfig> for TraceLogger {
    fn from(config: TraceLoggerConfig) -> Self {
        Self::new(config)
    }
}

impl QueryLogger for TraceLogger {
    /// Levels are decided per statement, so this returns the logger unchanged.
    fn set_level(self: Arc<Self>, _level: Level) -> Arc<dyn QueryLogger> {
        self
    }

    fn error(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::ERROR, args);
    }

    fn warn(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::WARN, args);
    }

    fn info(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::INFO, args);
    }

    fn trace(
        &self,
        ctx: &LogContext,
        begin: Instant,
        result: &dyn Fn() -> (String, i64),
        err: Option<&(dyn Error + 'static)>,
    ) {
        let elapsed = begin.elapsed();
        let mut level = self.config.default_level;
        let mut should_log = self.config.log_all;

        if !self.config.slow_threshold.is_zero() && elapsed > self.config.slow_threshold {
            level = Level::WARN;
            should_log = true;
        }

        if let Some(err) = err {
            if self.config.ignore_not_found_error && is_record_not_found(err) {
                return;
            }
            level = Level::ERROR;
            should_log = true;
        }

        if !should_log {
            return;
        }

        let sink = ctx.sink();
        if !sink.enabled(level) {
            return;
        }

        let mut record = self.start(level);
        if let Some(err) = err {
            record = record.err(err);
        }
        let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        record = record.int64(ELAPSED_FIELD, elapsed_ms);

        let (sql, rows) = result();
        if !sql.is_empty() {
            record = record.str(&self.config.sql_field_name, sql);
        }
        if rows > -1 {
            record = record.int64(ROWS_AFFECTED_FIELD, rows);
        }

        sink.send(&record);
    }

    fn filter_params<'a>(
        &self,
        _ctx: &LogContext,
        sql: &'a str,
        params: &'a [Value],
    ) -> (&'a str, &'a [Value]) {
        if !self.config.log_parameters {
            return (sql, &[]);
        }
        (sql, params)
    }
}
