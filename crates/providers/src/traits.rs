use sq_domain::error::Result;
use sq_domain::tool::{Message, ToolCall, ToolDefinition, Usage};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Tools the model may invoke. Empty means the model can only answer.
    pub tools: Vec<ToolDefinition>,
    /// `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// `None` leaves the response length uncapped.
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// e.g. "stop", "tool_calls", "length".
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Convert into the AI message that gets appended to the conversation.
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            Message::ai(self.content)
        } else {
            Message::ai_with_tool_calls(self.content, self.tool_calls)
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A chat model behind some wire protocol.
///
/// The agent only needs one blocking-style completion call per node, so
/// there is no streaming surface.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;
}
