//! The sqlagent gateway: the turn state machine and its runner, plus the
//! HTTP API and CLI built on top of it.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod graph;
pub mod runtime;
pub mod state;

pub use runtime::{TurnError, TurnOutcome, TurnRunner, TurnSettings};
pub use state::AppState;
