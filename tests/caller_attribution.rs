use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use sea_orm::{ConnectionTrait, DbBackend, DbErr, MockDatabase, Statement};
use sea_orm_query_logger::{JsonSink, LogContext, TraceLoggerConfig, TraceLoggerExt};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn first_line(&self) -> serde_json::Value {
        let bytes = self.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        serde_json::from_str(text.lines().next().unwrap()).unwrap()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn failing_query_caller(skip: usize) -> Option<String> {
    let buffer = Buffer::default();
    let traced = MockDatabase::new(DbBackend::Postgres)
        .append_query_errors([DbErr::Custom("relation does not exist".to_string())])
        .into_connection()
        .with_trace_logger_config(TraceLoggerConfig::default().with_skip_frames(skip))
        .with_context(LogContext::with_sink(JsonSink::new(buffer.clone())));

    let result = traced
        .query_all(Statement::from_string(DbBackend::Postgres, "SELECT * FROM missing"))
        .await;
    assert!(result.is_err());

    let line = buffer.first_line();
    assert_eq!(line["level"], "error");
    line["caller"].as_str().map(str::to_string)
}

fn is_internal(caller: &str) -> bool {
    caller.contains("src/logger.rs")
        || caller.contains("src/connection.rs")
        || caller.contains("src/caller.rs")
}

#[tokio::test]
async fn query_is_attributed_to_application_code() {
    let caller = failing_query_caller(1).await.expect("caller attached");
    let (file, _line) = caller.rsplit_once(':').unwrap();

    assert!(!is_internal(&caller), "attributed to {}", caller);
    assert!(file.ends_with("caller_attribution.rs"), "attributed to {}", caller);
}

#[tokio::test]
async fn skip_count_moves_attribution_outward() {
    let near = failing_query_caller(1).await;
    let far = failing_query_caller(3).await;

    assert_ne!(near, far);
    if let Some(far) = far {
        assert!(!is_internal(&far), "attributed to {}", far);
    }
}

#[tokio::test]
async fn zero_skip_attaches_no_caller() {
    assert_eq!(failing_query_caller(0).await, None);
}
