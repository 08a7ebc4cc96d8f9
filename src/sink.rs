//! Log sinks and the records they receive.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::level_filters::LevelFilter;
use tracing::{field, Level};

use crate::caller::Caller;

/// Target used for events forwarded by [`TracingSink`].
pub const TARGET: &str = "sea_orm_query_logger";

/// A structured field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Int64(i64),
}

impl FieldValue {
    fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(value) => Value::from(value.as_str()),
            FieldValue::Int64(value) => Value::from(*value),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(value) => write!(f, "{:?}", value),
            FieldValue::Int64(value) => write!(f, "{}", value),
        }
    }
}

/// A single log record, built up field by field and handed to a [`LogSink`].
///
/// Field names are borrowed, so a name owned by the logger configuration can
/// be attached without copying it.
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    level: Level,
    caller: Option<Caller>,
    error: Option<String>,
    fields: Vec<(&'a str, FieldValue)>,
    message: Option<String>,
}

impl<'a> LogRecord<'a> {
    /// Start a record at `level`.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            caller: None,
            error: None,
            fields: Vec::new(),
            message: None,
        }
    }

    /// Attribute the record to a source location.
    pub fn caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Attach an error.
    pub fn err(mut self, err: &dyn Error) -> Self {
        self.error = Some(err.to_string());
        self
    }

    /// Add a string field.
    pub fn str(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.fields.push((name, FieldValue::Str(value.into())));
        self
    }

    /// Add an integer field.
    pub fn int64(mut self, name: &'a str, value: i64) -> Self {
        self.fields.push((name, FieldValue::Int64(value)));
        self
    }

    /// Set the human-readable message.
    pub fn msg(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Location the record is attributed to, if any.
    pub fn caller_location(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    /// Text of the attached error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[(&'a str, FieldValue)] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, value)| value)
    }

    /// The human-readable message, if one was set.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Destination for [`LogRecord`]s.
///
/// Implementations decide on their own whether a record is kept. A sink
/// never reports failure back to the caller.
pub trait LogSink: Send + Sync {
    /// Whether records at `level` would be kept.
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    /// Emit one record.
    fn send(&self, record: &LogRecord<'_>);
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        _ => "trace",
    }
}

// `tracing` callsites carry their level statically, so pick the macro at runtime.
macro_rules! event_at {
    ($level:expr, $($args:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($args)+),
            Level::WARN => tracing::warn!($($args)+),
            Level::INFO => tracing::info!($($args)+),
            Level::DEBUG => tracing::debug!($($args)+),
            _ => tracing::trace!($($args)+),
        }
    };
}

/// Logfmt rendering of a record's structured fields.
struct Fields<'r, 'a>(&'r [(&'a str, FieldValue)]);

impl fmt::Display for Fields<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Sink that forwards records to the current `tracing` dispatcher.
///
/// Structured fields are rendered into a single `fields` value because
/// `tracing` field names are fixed at the callsite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a sink that forwards to `tracing`.
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn enabled(&self, level: Level) -> bool {
        level <= LevelFilter::current()
    }

    fn send(&self, record: &LogRecord<'_>) {
        let error = record.error().map(field::display);
        let caller = record.caller_location().map(field::display);
        let fields = (!record.fields().is_empty()).then(|| field::display(Fields(record.fields())));
        let message = record.message().unwrap_or_default();

        event_at!(
            record.level(),
            target: TARGET,
            error = error,
            caller = caller,
            fields = fields,
            "{}",
            message
        );
    }
}

/// Sink that writes one JSON object per record, one record per line.
///
/// ```rust
/// use sea_orm_query_logger::{JsonSink, LogContext};
///
/// let ctx = LogContext::with_sink(JsonSink::new(std::io::stderr()));
/// ```
pub struct JsonSink<W> {
    writer: Mutex<W>,
    max_level: LevelFilter,
}

impl<W: Write + Send> JsonSink<W> {
    /// Create a sink writing to `writer`, keeping every level.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            max_level: LevelFilter::TRACE,
        }
    }

    /// Drop records more verbose than `max_level`.
    pub fn with_max_level(mut self, max_level: impl Into<LevelFilter>) -> Self {
        self.max_level = max_level.into();
        self
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn render(record: &LogRecord<'_>) -> Value {
        let mut object = Map::new();
        object.insert("level".to_string(), Value::from(level_name(record.level())));
        if let Some(error) = record.error() {
            object.insert("error".to_string(), Value::from(error));
        }
        for (name, value) in record.fields() {
            object.insert((*name).to_string(), value.to_json());
        }
        if let Some(location) = record.caller_location() {
            object.insert("caller".to_string(), Value::from(location.to_string()));
        }
        if let Some(message) = record.message() {
            object.insert("message".to_string(), Value::from(message));
        }
        Value::Object(object)
    }
}

impl<W> fmt::Debug for JsonSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSink")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> LogSink for JsonSink<W> {
    fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    fn send(&self, record: &LogRecord<'_>) {
        if !self.enabled(record.level()) {
            return;
        }

        let line = Self::render(record);
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if serde_json::to_writer(&mut *writer, &line).is_ok() {
            let _ = writer.write_all(b"\n");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl Error for Boom {}

    #[test]
    fn test_record_builder() {
        let record = LogRecord::new(Level::WARN)
            .err(&Boom)
            .int64("elapsed_ms", 12)
            .str("sql", "SELECT 1")
            .msg("done");

        assert_eq!(record.level(), Level::WARN);
        assert_eq!(record.error(), Some("boom"));
        assert_eq!(record.field("elapsed_ms"), Some(&FieldValue::Int64(12)));
        assert_eq!(
            record.field("sql"),
            Some(&FieldValue::Str("SELECT 1".to_string()))
        );
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.message(), Some("done"));
        assert!(record.caller_location().is_none());
    }

    #[test]
    fn test_fields_logfmt() {
        let record = LogRecord::new(Level::INFO)
            .str("sql", "SELECT \"a\"")
            .int64("rows_affected", 3);

        assert_eq!(
            Fields(record.fields()).to_string(),
            r#"sql="SELECT \"a\"" rows_affected=3"#
        );
    }

    #[test]
    fn test_json_sink_line() {
        let buffer = SharedBuffer::default();
        let sink = JsonSink::new(buffer.clone());

        sink.send(
            &LogRecord::new(Level::ERROR)
                .err(&Boom)
                .int64("elapsed_ms", 4)
                .str("query", "SELECT 1")
                .msg("failed"),
        );

        assert_eq!(
            buffer.contents(),
            "{\"level\":\"error\",\"error\":\"boom\",\"elapsed_ms\":4,\"query\":\"SELECT 1\",\"message\":\"failed\"}\n"
        );
    }

    #[test]
    fn test_json_sink_caller() {
        let buffer = SharedBuffer::default();
        let sink = JsonSink::new(buffer.clone());
        let caller = Caller {
            file: "src/handlers.rs".to_string(),
            line: 42,
        };

        sink.send(&LogRecord::new(Level::INFO).caller(caller));

        let lines = buffer.lines();
        assert_eq!(lines[0]["caller"], "src/handlers.rs:42");
    }

    #[test]
    fn test_json_sink_max_level() {
        let buffer = SharedBuffer::default();
        let sink = JsonSink::new(buffer.clone()).with_max_level(Level::INFO);

        assert!(sink.enabled(Level::WARN));
        assert!(!sink.enabled(Level::DEBUG));

        sink.send(&LogRecord::new(Level::DEBUG).msg("hidden"));
        assert!(buffer.is_empty());

        sink.send(&LogRecord::new(Level::INFO).msg("shown"));
        assert_eq!(buffer.lines().len(), 1);
    }

    #[test]
    fn test_tracing_sink_forwards_event() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingSink::new();
            assert!(sink.enabled(Level::TRACE));
            sink.send(
                &LogRecord::new(Level::WARN)
                    .int64("elapsed_ms", 7)
                    .str("sql", "SELECT 1"),
            );
            sink.send(&LogRecord::new(Level::INFO).msg("info test"));
        });

        let output = buffer.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains(TARGET));
        assert!(output.contains("SELECT 1"));
        assert!(output.contains("elapsed_ms=7"));
        assert!(output.contains("info test"));
    }
}
