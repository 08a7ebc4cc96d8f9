//! Logged database connection wrapper.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    ExecResult, IsolationLevel, QueryResult, Statement, StreamTrait, TransactionError,
    TransactionTrait,
};

use crate::config::TraceLoggerConfig;
use crate::context::LogContext;
use crate::logger::{QueryLogger, TraceLogger};

/// A logged wrapper around SeaORM's `DatabaseConnection`.
///
/// This wrapper implements `ConnectionTrait`, `StreamTrait`, and `TransactionTrait`,
/// making it a drop-in replacement for `DatabaseConnection`. Every statement is
/// reported to the wrapped [`QueryLogger`] once it completes.
///
/// # Example
///
/// ```rust,ignore
/// use sea_orm::Database;
/// use sea_orm_query_logger::TracedConnection;
///
/// let db = Database::connect("postgres://localhost/mydb").await?;
/// let traced = TracedConnection::from(db);
///
/// // Slow and failing queries are now logged
/// let users = Users::find().all(&traced).await?;
/// ```
pub struct TracedConnection {
    inner: DatabaseConnection,
    logger: Arc<dyn QueryLogger>,
    context: LogContext,
}

impl TracedConnection {
    /// Create a new traced connection reporting to `logger`.
    pub fn new(connection: DatabaseConnection, logger: impl QueryLogger + 'static) -> Self {
        Self::with_logger(connection, Arc::new(logger))
    }

    /// Create a new traced connection reporting to a shared logger.
    pub fn with_logger(connection: DatabaseConnection, logger: Arc<dyn QueryLogger>) -> Self {
        Self {
            inner: connection,
            logger,
            context: LogContext::background(),
        }
    }

    /// Create a new traced connection with the default [`TraceLogger`].
    pub fn wrap(connection: DatabaseConnection) -> Self {
        Self::new(connection, TraceLogger::default())
    }

    /// Report through the sink bound to `context` instead of the default one.
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// Get a reference to the underlying `DatabaseConnection`.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Get the logger statements are reported to.
    pub fn logger(&self) -> &Arc<dyn QueryLogger> {
        &self.logger
    }

    /// Get the context the logger resolves its sink from.
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Consume the wrapper and return the inner `DatabaseConnection`.
    pub fn into_inner(self) -> DatabaseConnection {
        self.inner
    }

    /// Render a statement for logging, inlining only the parameters the
    /// logger lets through.
    fn render_sql(&self, stmt: &Statement) -> String {
        let values = stmt
            .values
            .as_ref()
            .map(|values| values.0.as_slice())
            .unwrap_or_default();
        let (sql, params) = self.logger.filter_params(&self.context, &stmt.sql, values);

        if params.is_empty() {
            sql.to_string()
        } else {
            Statement::from_sql_and_values(stmt.db_backend, sql, params.iter().cloned()).to_string()
        }
    }

    /// Report the result of a statement to the logger.
    fn trace_statement<T>(
        &self,
        stmt: &Statement,
        start: Instant,
        result: &Result<T, DbErr>,
        row_count: impl Fn(&T) -> i64,
    ) {
        let err = result.as_ref().err().map(|e| e as &(dyn Error + 'static));
        self.logger.trace(
            &self.context,
            start,
            &|| {
                let rows = result.as_ref().map(|value| row_count(value)).unwrap_or(-1);
                (self.render_sql(stmt), rows)
            },
            err,
        );
    }

    /// Report a statement-less operation such as `BEGIN`.
    fn trace_command(&self, command: &str, start: Instant, err: Option<&DbErr>) {
        self.logger.trace(
            &self.context,
            start,
            &|| (command.to_string(), -1),
            err.map(|e| e as &(dyn Error + 'static)),
        );
    }

    /// A callback error belongs to the application and only shows up as the
    /// `ROLLBACK` it caused.
    fn trace_transaction<T, E>(&self, start: Instant, result: &Result<T, TransactionError<E>>) {
        match result {
            Ok(_) => self.trace_command("TRANSACTION", start, None),
            Err(TransactionError::Connection(e)) => {
                self.trace_command("TRANSACTION", start, Some(e))
            }
            Err(TransactionError::Transaction(_)) => self.trace_command("ROLLBACK", start, None),
        }
    }
}

fn saturating_rows(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl fmt::Debug for TracedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedConnection")
            .field("inner", &self.inner)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl From<DatabaseConnection> for TracedConnection {
    fn from(connection: DatabaseConnection) -> Self {
        Self::wrap(connection)
    }
}

impl AsRef<DatabaseConnection> for TracedConnection {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.inner
    }
}

#[async_trait]
impl ConnectionTrait for TracedConnection {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        let start = Instant::now();
        let result = self.inner.execute(stmt.clone()).await;
        self.trace_statement(&stmt, start, &result, |r| saturating_rows(r.rows_affected()));
        result
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        let stmt = Statement::from_string(self.get_database_backend(), sql);
        let start = Instant::now();
        let result = self.inner.execute_unprepared(sql).await;
        self.trace_statement(&stmt, start, &result, |r| saturating_rows(r.rows_affected()));
        result
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        let start = Instant::now();
        let result = self.inner.query_one(stmt.clone()).await;
        self.trace_statement(&stmt, start, &result, |row| i64::from(row.is_some()));
        result
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        let start = Instant::now();
        let result = self.inner.query_all(stmt.clone()).await;
        self.trace_statement(&stmt, start, &result, |rows| saturating_rows(rows.len() as u64));
        result
    }

    fn support_returning(&self) -> bool {
        self.inner.support_returning()
    }

    fn is_mock_connection(&self) -> bool {
        self.inner.is_mock_connection()
    }
}

#[async_trait]
impl StreamTrait for TracedConnection {
    type Stream<'a> = <DatabaseConnection as StreamTrait>::Stream<'a>;

    fn stream<'a>(
        &'a self,
        stmt: Statement,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Stream<'a>, DbErr>> + 'a + Send>> {
        let start = Instant::now();

        Box::pin(async move {
            let result = self.inner.stream(stmt.clone()).await;
            // Rows are consumed lazily, so the count is unknown here.
            self.trace_statement(&stmt, start, &result, |_| -1);
            result
        })
    }
}

#[async_trait]
impl TransactionTrait for TracedConnection {
    async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        let start = Instant::now();
        let result = self.inner.begin().await;
        self.trace_command("BEGIN", start, result.as_ref().err());
        result
    }

    async fn begin_with_config(
        &self,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<DatabaseTransaction, DbErr> {
        let start = Instant::now();
        let result = self
            .inner
            .begin_with_config(isolation_level, access_mode)
            .await;
        self.trace_command("BEGIN", start, result.as_ref().err());
        result
    }

    async fn transaction<F, T, E>(&self, callback: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        let start = Instant::now();
        let result = self.inner.transaction(callback).await;
        self.trace_transaction(start, &result);
        result
    }

    async fn transaction_with_config<F, T, E>(
        &self,
        callback: F,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        let start = Instant::now();
        let result = self
            .inner
            .transaction_with_config(callback, isolation_level, access_mode)
            .await;
        self.trace_transaction(start, &result);
        result
    }
}

/// Extension trait for easy wrapping of database connections.
pub trait TraceLoggerExt {
    /// Wrap this connection with the default [`TraceLogger`].
    fn with_trace_logger(self) -> TracedConnection;

    /// Wrap this connection with a [`TraceLogger`] built from `config`.
    fn with_trace_logger_config(self, config: TraceLoggerConfig) -> TracedConnection;
}

impl TraceLoggerExt for DatabaseConnection {
    fn with_trace_logger(self) -> TracedConnection {
        TracedConnection::wrap(self)
    }

    fn with_trace_logger_config(self, config: TraceLoggerConfig) -> TracedConnection {
        TracedConnection::new(self, TraceLogger::new(config))
    }
}
