//! Tools the model can call.
//!
//! The registry maps tool names to implementations; the only built-in tool
//! is `run_database_call`, a read-only SQL runner.

pub mod registry;
pub mod sql;

pub use registry::{Tool, ToolOutput, ToolRegistry};
pub use sql::{RunDatabaseCall, RUN_DATABASE_CALL};
