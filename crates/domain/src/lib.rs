//! Shared types for the sqlagent workspace: the error taxonomy, the
//! conversation message model, configuration and structured trace events.

pub mod config;
pub mod error;
pub mod tool;
pub mod trace;

pub use error::{Error, Result};
