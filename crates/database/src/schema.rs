use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sq_domain::error::{Error, Result};
use sq_domain::trace::TraceEvent;

use crate::executor::{QueryExecutor, Record};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Snapshot
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Tables and their columns, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableSchema>,
}

impl SchemaSnapshot {
    /// Group `(schema, table, column)` rows into tables.
    ///
    /// Rows from an excluded schema are dropped even if the catalog query
    /// let them through. Tables keep the order they first appear in, and
    /// same-named tables from different schemas are merged.
    pub fn from_rows<I>(rows: I, excluded: &[String]) -> Self
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let mut tables: Vec<TableSchema> = Vec::new();
        for (schema, table, column) in rows {
            if excluded.iter().any(|x| x.eq_ignore_ascii_case(&schema)) {
                continue;
            }
            match tables.iter_mut().find(|t| t.name == table) {
                Some(t) => t.columns.push(column),
                None => tables.push(TableSchema {
                    name: table,
                    columns: vec![column],
                }),
            }
        }
        Self { tables }
    }

    /// One `table: col1, col2` line per table.
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|t| format!("{}: {}", t.name, t.columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Introspector
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reads the table/column catalog through a [`QueryExecutor`].
pub struct SchemaIntrospector {
    executor: Arc<dyn QueryExecutor>,
    excluded: Vec<String>,
}

impl SchemaIntrospector {
    pub fn new(executor: Arc<dyn QueryExecutor>, excluded: Vec<String>) -> Self {
        Self { executor, excluded }
    }

    /// Run the catalog query and build a fresh snapshot.
    ///
    /// Never cached. Any failure, including a malformed catalog row, is an
    /// [`Error::Schema`]; an empty schema is only returned when the catalog
    /// really is empty.
    pub async fn fetch_schema(&self) -> Result<SchemaSnapshot> {
        let start = Instant::now();
        let records = self
            .executor
            .execute(&schema_query(&self.excluded))
            .await
            .map_err(|e| Error::Schema(e.to_string()))?;

        let rows = records
            .iter()
            .map(catalog_row)
            .collect::<Result<Vec<_>>>()?;
        let snapshot = SchemaSnapshot::from_rows(rows, &self.excluded);

        TraceEvent::SchemaFetched {
            tables: snapshot.tables.len(),
            columns: snapshot.column_count(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(snapshot)
    }
}

/// Catalog query over `information_schema.columns`.
///
/// Lowercase aliases keep the result keys stable across MySQL versions,
/// which otherwise disagree on the case of catalog column names.
pub fn schema_query(excluded: &[String]) -> String {
    let mut sql = String::from(
        "SELECT table_schema AS table_schema, table_name AS table_name, \
         column_name AS column_name FROM information_schema.columns",
    );
    if !excluded.is_empty() {
        let list = excluded
            .iter()
            .map(|s| format!("'{}'", s.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" WHERE table_schema NOT IN ({list})"));
    }
    sql.push_str(" ORDER BY table_name, table_schema, ordinal_position");
    sql
}

fn catalog_row(record: &Record) -> Result<(String, String, String)> {
    let field = |name: &str| -> Result<String> {
        record
            .get(name)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| Error::Schema(format!("catalog row is missing '{name}'")))
    };
    Ok((field("table_schema")?, field("table_name")?, field("column_name")?))
}
