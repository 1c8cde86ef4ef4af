//! `run_database_call` against scripted executors.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use sq_database::{QueryExecutor, Record};
use sq_domain::error::{Error, Result};
use sq_domain::tool::ToolCall;
use sq_tools::{RunDatabaseCall, ToolRegistry, RUN_DATABASE_CALL};

/// Answers every statement with the same rows and remembers what it ran.
struct FakeDb {
    rows: Vec<Record>,
    ran: Mutex<Vec<String>>,
}

impl FakeDb {
    fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            rows: rows
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
            ran: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl QueryExecutor for FakeDb {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>> {
        self.ran.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }
}

struct DownDb;

#[async_trait::async_trait]
impl QueryExecutor for DownDb {
    async fn execute(&self, _sql: &str) -> Result<Vec<Record>> {
        Err(Error::Connection("Can't connect to MySQL server on 'db:3306'".into()))
    }
}

fn call(args: Value) -> ToolCall {
    ToolCall {
        call_id: "call_1".into(),
        tool_name: RUN_DATABASE_CALL.into(),
        arguments: args,
    }
}

fn registry(exec: Arc<dyn QueryExecutor>, max_rows: usize) -> ToolRegistry {
    ToolRegistry::new().register(Arc::new(RunDatabaseCall::new(exec, max_rows)))
}

#[tokio::test]
async fn count_query_returns_json_rows() {
    let db = FakeDb::with_rows(vec![json!({ "COUNT(*)": 42 })]);
    let reg = registry(db.clone(), 200);

    let out = reg
        .dispatch(&call(json!({ "sql_query": "SELECT COUNT(*) FROM students" })))
        .await;

    assert!(!out.is_error, "{}", out.content);
    assert_eq!(out.content, "[{\"COUNT(*)\":42}]");
    assert_eq!(db.ran.lock().unwrap().as_slice(), ["SELECT COUNT(*) FROM students"]);
}

#[tokio::test]
async fn column_order_is_preserved() {
    let db = FakeDb::with_rows(vec![json!({ "name": "Ada", "age": 36, "city": "London" })]);
    let out = registry(db, 200)
        .dispatch(&call(json!({ "sql_query": "SELECT name, age, city FROM students" })))
        .await;
    assert_eq!(out.content, "[{\"name\":\"Ada\",\"age\":36,\"city\":\"London\"}]");
}

#[tokio::test]
async fn write_statements_never_reach_the_database() {
    let db = FakeDb::with_rows(vec![]);
    let reg = registry(db.clone(), 200);

    for sql in [
        "DELETE FROM students",
        "UPDATE students SET name = 'x'",
        "DROP TABLE students",
        "SELECT 1; DROP TABLE students",
    ] {
        let out = reg.dispatch(&call(json!({ "sql_query": sql }))).await;
        assert!(out.is_error, "{sql}");
        assert!(out.content.contains("rejected"), "{}", out.content);
    }
    assert!(db.ran.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_database_is_reported_as_text() {
    let out = registry(Arc::new(DownDb), 200)
        .dispatch(&call(json!({ "sql_query": "SELECT 1" })))
        .await;
    assert!(out.is_error);
    assert!(out.content.contains("Can't connect to MySQL server"), "{}", out.content);
}

#[tokio::test]
async fn bad_arguments_are_reported_as_text() {
    let reg = registry(FakeDb::with_rows(vec![]), 200);
    let out = reg.dispatch(&call(json!({ "query": "SELECT 1" }))).await;
    assert!(out.is_error);
    assert!(out.content.contains("sql_query"));

    let out = reg.dispatch(&call(Value::String("SELECT 1".into()))).await;
    assert!(out.is_error);
}

#[tokio::test]
async fn large_results_are_truncated_with_a_note() {
    let rows = (0..5).map(|i| json!({ "id": i })).collect();
    let out = registry(FakeDb::with_rows(rows), 2)
        .dispatch(&call(json!({ "sql_query": "SELECT id FROM students" })))
        .await;
    assert!(!out.is_error);
    assert!(out.content.starts_with("[{\"id\":0},{\"id\":1}]"));
    assert!(out.content.contains("first 2 of 5 rows"));
}

#[test]
fn advertises_single_string_argument() {
    let reg = registry(FakeDb::with_rows(vec![]), 200);
    let defs = reg.definitions();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "run_database_call");
    assert_eq!(defs[0].parameters["required"], json!(["sql_query"]));
}
