use std::time::Instant;

use serde_json::{Map, Number, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row, TypeInfo, ValueRef};
use sq_domain::error::{Error, Result};

use crate::credentials::DbCredentials;

/// One result row: column name to scalar, in select-list order.
pub type Record = Map<String, Value>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Runs a single SQL statement and returns every row.
///
/// Implementations must not keep connections between calls and must not
/// retry. Unreachable servers and rejected credentials surface as
/// [`Error::Connection`]; statements the server refuses surface as
/// [`Error::Query`].
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MySQL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection-per-call MySQL executor.
pub struct MySqlExecutor {
    options: MySqlConnectOptions,
}

impl MySqlExecutor {
    pub fn new(creds: &DbCredentials) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&creds.host)
            .port(creds.port)
            .database(&creds.database)
            .username(&creds.user)
            .password(creds.password());
        Self { options }
    }
}

#[async_trait::async_trait]
impl QueryExecutor for MySqlExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>> {
        let start = Instant::now();

        let mut conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        // Text protocol: every value arrives as its textual form, which
        // keeps DECIMAL and temporal columns decodable without per-type
        // binary codecs.
        let fetched = (&mut conn).fetch_all(sqlx::raw_sql(sql)).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close database connection cleanly");
        }

        let rows = fetched.map_err(map_sqlx_error)?;
        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            rows = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "statement executed"
        );
        Ok(records)
    }
}

fn map_sqlx_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db) => Error::Query(db.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::Connection(e.to_string()),
        other => Error::Query(other.to_string()),
    }
}

// ── Row decoding ───────────────────────────────────────────────────

fn row_to_record(row: &MySqlRow) -> Result<Record> {
    let mut record = Map::with_capacity(row.columns().len());
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, i, column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &MySqlRow, i: usize, type_name: &str) -> Result<Value> {
    let raw = row
        .try_get_raw(i)
        .map_err(|e| Error::Query(format!("column {i}: {e}")))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let text = match row.try_get_unchecked::<String, _>(i) {
        Ok(s) => s,
        Err(_) => {
            let bytes: Vec<u8> = row
                .try_get_unchecked(i)
                .map_err(|e| Error::Query(format!("column {i}: {e}")))?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    Ok(text_to_json(type_name, text))
}

/// Map a textual MySQL value to JSON using the column's declared type.
///
/// Integers and binary floats become JSON numbers. DECIMAL keeps its exact
/// text. Anything that fails to parse is passed through as a string.
pub(crate) fn text_to_json(type_name: &str, text: String) -> Value {
    let base = type_name.trim_end_matches(" UNSIGNED");
    match base {
        "BOOLEAN" => match text.as_str() {
            "0" => Value::Bool(false),
            "1" => Value::Bool(true),
            _ => Value::String(text),
        },
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            if let Ok(n) = text.parse::<i64>() {
                Value::Number(n.into())
            } else if let Ok(n) = text.parse::<u64>() {
                Value::Number(n.into())
            } else {
                Value::String(text)
            }
        }
        "FLOAT" | "DOUBLE" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}
