//! # sea-orm-query-logger
//!
//! Query-trace logging for SeaORM database operations.
//!
//! This crate reports every SeaORM statement to a [`QueryLogger`] once it
//! completes. The bundled [`TraceLogger`] keeps steady-state logs quiet and
//! only surfaces anomalies: slow statements are logged at WARN and failed
//! statements at ERROR.
//!
//! ## Features
//!
//! - **Drop-in Connection**: All queries executed through `TracedConnection` are reported
//! - **Slow Query Detection**: Statements above a threshold are escalated to WARN
//! - **Error Escalation**: Failed statements are logged at ERROR with the error attached
//! - **Parameter Redaction**: Query parameters stay out of the logs unless enabled
//! - **Pluggable Sinks**: Records go to `tracing` by default, or to any [`LogSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sea_orm::Database;
//! use sea_orm_query_logger::TracedConnection;
//!
//! // Wrap your existing connection
//! let db = Database::connect("postgres://localhost/mydb").await?;
//! let traced_db = TracedConnection::from(db);
//!
//! // Use it exactly like a normal DatabaseConnection
//! let users = Users::find().all(&traced_db).await?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use sea_orm_query_logger::{TraceLoggerConfig, TraceLoggerExt};
//!
//! let traced_db = db.with_trace_logger_config(
//!     TraceLoggerConfig::default()
//!         .with_parameter_logging(false)     // Inline query parameters (default: false)
//!         .with_ignore_not_found_error(true) // Skip DbErr::RecordNotFound
//!         .with_slow_threshold(Duration::from_millis(100)),
//! );
//! ```
//!
//! ## Record Fields
//!
//! | Field | Description |
//! |-------|-------------|
//! | `elapsed_ms` | Statement duration in milliseconds |
//! | `sql` | SQL text (name configurable), omitted when empty |
//! | `rows_affected` | Rows returned/affected, omitted when unknown |
//! | `error` | Error text (on failure) |
//! | `caller` | Call site (when caller skip frames are configured) |

mod caller;
mod config;
mod connection;
mod context;
mod logger;
mod sink;

pub use caller::Caller;
pub use config::TraceLoggerConfig;
pub use connection::{TraceLoggerExt, TracedConnection};
pub use context::{default_sink, LogContext};
pub use logger::{
    is_record_not_found, QueryLogger, TraceLogger, ELAPSED_FIELD, ROWS_AFFECTED_FIELD,
};
pub use sink::{FieldValue, JsonSink, LogRecord, LogSink, TracingSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        LogContext, QueryLogger, TraceLogger, TraceLoggerConfig, TraceLoggerExt, TracedConnection,
    };
}
