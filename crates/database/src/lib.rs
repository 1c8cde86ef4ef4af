//! Everything that touches the relational store: running statements,
//! deciding whether a statement is safe to run, and describing the schema.

pub mod classifier;
pub mod credentials;
pub mod executor;
pub mod schema;

pub use classifier::{check_read_only, is_read_only};
pub use credentials::DbCredentials;
pub use executor::{MySqlExecutor, QueryExecutor, Record};
pub use schema::{SchemaIntrospector, SchemaSnapshot, TableSchema};
