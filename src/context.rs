//! Call-scoped sink lookup.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::sink::{LogSink, TracingSink};

// Fallback for contexts without a bound sink, initialised on first use.
static DEFAULT_SINK: Lazy<TracingSink> = Lazy::new(TracingSink::new);

/// The process-wide fallback sink.
pub fn default_sink() -> &'static dyn LogSink {
    &*DEFAULT_SINK
}

/// Carries the log sink for one request or call chain.
///
/// Cloning is cheap. A context without a bound sink resolves to
/// [`default_sink`], which forwards to `tracing`.
///
/// # Example
///
/// ```rust
/// use sea_orm_query_logger::{JsonSink, LogContext};
///
/// let background = LogContext::background();
/// let request = LogContext::with_sink(JsonSink::new(Vec::new()));
/// assert!(!background.has_sink());
/// assert!(request.has_sink());
/// ```
#[derive(Clone, Default)]
pub struct LogContext {
    sink: Option<Arc<dyn LogSink>>,
}

impl LogContext {
    /// A context with no bound sink.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context bound to `sink`.
    pub fn with_sink(sink: impl LogSink + 'static) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    /// A context bound to a shared sink.
    pub fn from_arc(sink: Arc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Whether a sink is bound to this context.
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Resolve the sink for this context.
    pub fn sink(&self) -> &dyn LogSink {
        match &self.sink {
            Some(sink) => sink.as_ref(),
            None => default_sink(),
        }
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("has_sink", &self.has_sink())
            .finish()
    }
}

impl From<Arc<dyn LogSink>> for LogContext {
    fn from(sink: Arc<dyn LogSink>) -> Self {
        Self::from_arc(sink)
    }
}
