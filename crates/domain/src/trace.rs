use serde::Serialize;

/// Structured trace events emitted across all sqlagent crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        /// Which node issued the call (`agent` or `generate`).
        node: String,
        tools_bound: usize,
        attempt: u32,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    SchemaFetched {
        tables: usize,
        columns: usize,
        duration_ms: u64,
    },
    QueryExecuted {
        sql: String,
        rows: usize,
        duration_ms: u64,
    },
    QueryRejected {
        sql: String,
        reason: String,
    },
    SessionResolved {
        session_key: String,
        is_new: bool,
    },
    MessagesAppended {
        session_key: String,
        count: usize,
    },
    TurnCompleted {
        session_key: String,
        used_tool: bool,
        appended: usize,
        duration_ms: u64,
        outcome: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sq_event");
    }
}
