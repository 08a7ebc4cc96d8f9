//! Basic example showing how to use sea-orm-query-logger.
//!
//! Run with: cargo run --example basic

use std::collections::BTreeMap;
use std::time::Duration;

use sea_orm::{ConnectionTrait, DbBackend, DbErr, MockDatabase, Statement, Value};
use sea_orm_query_logger::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sea_orm_query_logger=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A mock database stands in for a real connection
    let db = MockDatabase::new(DbBackend::Postgres)
        .append_query_results([vec![BTreeMap::from([("id", Value::from(1i32))])]])
        .append_query_errors([DbErr::Custom("relation \"missing\" does not exist".into())])
        .into_connection();

    // Option 1: Simple wrapping with defaults (slow or failed queries only)
    // let traced_db = TracedConnection::from(db);

    // Option 2: Development config (logs everything, parameters included)
    let traced_db = db.with_trace_logger_config(
        TraceLoggerConfig::development().with_slow_threshold(Duration::from_millis(250)),
    );

    // Option 3: JSON lines on stderr instead of tracing
    // let traced_db = traced_db.with_context(LogContext::with_sink(JsonSink::new(std::io::stderr())));

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT id FROM users WHERE id = $1",
        [Value::from(1i32)],
    );
    traced_db.query_all(stmt).await?;

    let failing = Statement::from_string(DbBackend::Postgres, "SELECT * FROM missing");
    if traced_db.query_all(failing).await.is_err() {
        traced_db
            .logger()
            .info(traced_db.context(), format_args!("failed query was reported"));
    }

    Ok(())
}
