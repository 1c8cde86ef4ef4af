use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn execution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Wall-clock budget for one turn, model retries included.
    #[serde(default = "d_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
    /// Rows kept from a query result before it is handed to the model.
    #[serde(default = "d_max_result_rows")]
    pub max_result_rows: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: d_turn_timeout_ms(),
            max_result_rows: d_max_result_rows(),
        }
    }
}

fn d_turn_timeout_ms() -> u64 {
    120_000
}
fn d_max_result_rows() -> usize {
    200
}
