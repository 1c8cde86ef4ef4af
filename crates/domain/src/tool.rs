use serde::{Deserialize, Serialize};

/// A tool invocation requested by the model (provider-agnostic).
/// Every adapter converts provider-specific tool calls to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Ai,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Human => "human",
            Role::Ai => "ai",
            Role::Tool => "tool",
        }
    }
}

/// One entry of a conversation.
///
/// `tool_calls` is only ever populated on [`Role::Ai`] messages and
/// `tool_call_id` only on [`Role::Tool`] messages. Use the constructors
/// below rather than building the struct by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::plain(Role::Human, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::plain(Role::Ai, text)
    }

    /// An AI message that requests one or more tool invocations.
    pub fn ai_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Ai,
            content: text.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// The answer to the tool call identified by `call_id`.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Most recent human message, searching backward from the end.
///
/// The human message is not assumed to be the last element: tool and AI
/// messages from earlier nodes may follow it.
pub fn last_human(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == Role::Human)
}

/// Most recent tool message of the current exchange.
///
/// Stops at the first human message encountered so a tool result from a
/// previous question is never mistaken for the current one.
pub fn last_tool_result(messages: &[Message]) -> Option<&Message> {
    for msg in messages.iter().rev() {
        match msg.role {
            Role::Human => return None,
            Role::Tool => return Some(msg),
            _ => {}
        }
    }
    None
}

/// Token usage for a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            call_id: id.into(),
            tool_name: "run_database_call".into(),
            arguments: serde_json::json!({ "sql_query": "SELECT 1" }),
        }
    }

    #[test]
    fn last_human_skips_trailing_tool_traffic() {
        let msgs = vec![
            Message::human("first"),
            Message::ai("answer"),
            Message::human("second"),
            Message::ai_with_tool_calls("", vec![call("c1")]),
            Message::tool_result("c1", "[]"),
        ];
        assert_eq!(last_human(&msgs).unwrap().content, "second");
    }

    #[test]
    fn last_human_none_when_absent() {
        let msgs = vec![Message::system("sys"), Message::ai("hello")];
        assert!(last_human(&msgs).is_none());
    }

    #[test]
    fn last_tool_result_does_not_cross_human_boundary() {
        let msgs = vec![
            Message::human("q1"),
            Message::ai_with_tool_calls("", vec![call("c1")]),
            Message::tool_result("c1", "old rows"),
            Message::ai("a1"),
            Message::human("q2"),
            Message::ai("a2"),
        ];
        assert!(last_tool_result(&msgs).is_none());
    }

    #[test]
    fn last_tool_result_finds_current_exchange() {
        let msgs = vec![
            Message::human("q"),
            Message::ai_with_tool_calls("", vec![call("c9")]),
            Message::tool_result("c9", "[{\"n\":1}]"),
        ];
        let tool = last_tool_result(&msgs).unwrap();
        assert_eq!(tool.tool_call_id.as_deref(), Some("c9"));
    }

    #[test]
    fn plain_messages_serialize_without_tool_fields() {
        let json = serde_json::to_value(Message::human("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "human", "content": "hi" }));
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("abc", "rows");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("abc"));
        assert!(!msg.has_tool_calls());
    }
}
