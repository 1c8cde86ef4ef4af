//! `run_database_call`: the model's only way to read the database.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use sq_database::{check_read_only, QueryExecutor};
use sq_domain::error::{Error, Result};
use sq_domain::tool::ToolDefinition;
use sq_domain::trace::TraceEvent;

use crate::registry::Tool;

pub const RUN_DATABASE_CALL: &str = "run_database_call";

#[derive(Debug, Deserialize)]
struct RunDatabaseCallArgs {
    sql_query: String,
}

/// Runs model-authored SQL after the read-only gate.
pub struct RunDatabaseCall {
    executor: Arc<dyn QueryExecutor>,
    max_rows: usize,
}

impl RunDatabaseCall {
    pub fn new(executor: Arc<dyn QueryExecutor>, max_rows: usize) -> Self {
        Self { executor, max_rows }
    }

    fn failure(message: impl Into<String>) -> Error {
        Error::ToolExecution {
            tool: RUN_DATABASE_CALL.into(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for RunDatabaseCall {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: RUN_DATABASE_CALL.into(),
            description: "Run a read-only SQL SELECT query against the database and return \
                          the resulting rows as a JSON array of objects."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "A single MySQL SELECT statement."
                    }
                },
                "required": ["sql_query"]
            }),
        }
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let args = RunDatabaseCallArgs::deserialize(arguments).map_err(|e| {
            Self::failure(format!(
                "invalid arguments, expected {{\"sql_query\": \"<SELECT ...>\"}}: {e}"
            ))
        })?;
        let sql = args.sql_query.trim();

        if let Err(reason) = check_read_only(sql) {
            TraceEvent::QueryRejected {
                sql: sql.to_owned(),
                reason: reason.clone(),
            }
            .emit();
            return Err(Self::failure(format!(
                "query rejected, only read-only SELECT statements are allowed: {reason}"
            )));
        }

        let start = Instant::now();
        let mut rows = self
            .executor
            .execute(sql)
            .await
            .map_err(|e| Self::failure(e.to_string()))?;
        let total = rows.len();

        TraceEvent::QueryExecuted {
            sql: sql.to_owned(),
            rows: total,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        rows.truncate(self.max_rows);
        let mut out = serde_json::to_string(&rows)?;
        if total > self.max_rows {
            out.push_str(&format!(
                "\n(result truncated: showing the first {} of {total} rows)",
                self.max_rows
            ));
        }
        Ok(out)
    }
}
