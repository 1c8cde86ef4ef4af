use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use sq_domain::error::Result;
use sq_domain::tool::{ToolCall, ToolDefinition};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. The returned text becomes the tool message content.
    async fn call(&self, arguments: &Value) -> Result<String>;
}

/// What a dispatched tool call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tools keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Returns self for chaining.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
        self
    }

    /// Definitions for every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run one tool call.
    ///
    /// Never fails: an unknown tool or a tool error is turned into text the
    /// model can read, flagged with `is_error`.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let Some(tool) = self.tools.get(&call.tool_name) else {
            let mut known: Vec<&str> = self.tools.keys().map(String::as_str).collect();
            known.sort_unstable();
            tracing::warn!(tool = %call.tool_name, "model requested an unknown tool");
            return ToolOutput {
                content: format!(
                    "Error: tool '{}' does not exist. Available tools: {}",
                    call.tool_name,
                    known.join(", ")
                ),
                is_error: true,
            };
        };

        match tool.call(&call.arguments).await {
            Ok(content) => ToolOutput {
                content,
                is_error: false,
            },
            Err(e) => {
                tracing::warn!(tool = %call.tool_name, call_id = %call.call_id, error = %e, "tool call failed");
                ToolOutput {
                    content: format!("Error: {e}"),
                    is_error: true,
                }
            }
        }
    }
}
