//! OpenAI-compatible chat completions adapter.
//!
//! Groq, OpenAI, Ollama, vLLM and LM Studio all accept the same request
//! shape, so one adapter covers every supported model host.

use std::time::Duration;

use serde_json::Value;
use sq_domain::config::LlmConfig;
use sq_domain::error::{Error, Result};
use sq_domain::tool::{Message, Role, ToolCall, ToolDefinition, Usage};

use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: String,
    auth_header: String,
    auth_prefix: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Build the adapter, resolving the API key up front.
    ///
    /// A missing key is an [`Error::Auth`], which the caller treats as a
    /// fatal startup error.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        Self::with_api_key(cfg, api_key)
    }

    /// Build the adapter with an already-resolved key.
    pub fn with_api_key(cfg: &LlmConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_header: cfg
                .auth
                .header
                .clone()
                .unwrap_or_else(|| "Authorization".into()),
            auth_prefix: cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into()),
            default_model: cfg.model.clone(),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let header_value = format!("{}{}", self.auth_prefix, self.api_key);
        self.client
            .post(url)
            .header(&self.auth_header, header_value)
            .header("Content-Type", "application/json")
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if !req.tools.is_empty() {
            let tools: Vec<Value> = req.tools.iter().map(tool_to_openai).collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn msg_to_openai(msg: &Message) -> Value {
    match msg.role {
        Role::System => serde_json::json!({ "role": "system", "content": msg.content }),
        Role::Human => serde_json::json!({ "role": "user", "content": msg.content }),
        Role::Ai => ai_to_openai(msg),
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
            "content": msg.content,
        }),
    }
}

fn ai_to_openai(msg: &Message) -> Value {
    let mut obj = serde_json::json!({ "role": "assistant" });
    obj["content"] = if msg.content.is_empty() && msg.has_tool_calls() {
        Value::Null
    } else {
        Value::String(msg.content.clone())
    };
    if msg.has_tool_calls() {
        let calls: Vec<Value> = msg
            .tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.call_id,
                    "type": "function",
                    "function": {
                        "name": tc.tool_name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        obj["tool_calls"] = Value::Array(calls);
    }
    obj
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_chat_response(provider: &str, body: &Value) -> Result<ChatResponse> {
    let malformed = |message: &str| Error::Provider {
        provider: provider.to_string(),
        message: message.to_string(),
        status: None,
    };

    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| malformed("no choices in response"))?;

    let message = choice
        .get("message")
        .ok_or_else(|| malformed("no message in choice"))?;

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(ChatResponse {
        content,
        tool_calls: parse_openai_tool_calls(message),
        usage: body.get("usage").and_then(parse_openai_usage),
        model: body
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        finish_reason: choice
            .get("finish_reason")
            .and_then(|v| v.as_str())
            .map(String::from),
    })
}

fn parse_openai_tool_calls(message: &Value) -> Vec<ToolCall> {
    let Some(arr) = message.get("tool_calls").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|tc| {
            let call_id = tc.get("id")?.as_str()?.to_string();
            let func = tc.get("function")?;
            let tool_name = func.get("name")?.as_str()?.to_string();
            let args_str = func.get("arguments")?.as_str().unwrap_or("{}");
            // Malformed arguments are kept as a raw string so the tool can
            // report them back to the model instead of silently dropping the call.
            let arguments: Value = serde_json::from_str(args_str)
                .unwrap_or_else(|_| Value::String(args_str.to_string()));
            Some(ToolCall {
                call_id,
                tool_name,
                arguments,
            })
        })
        .collect()
}

fn parse_openai_usage(v: &Value) -> Option<Usage> {
    Some(Usage {
        prompt_tokens: v.get("prompt_tokens")?.as_u64()? as u32,
        completion_tokens: v.get("completion_tokens")?.as_u64()? as u32,
        total_tokens: v.get("total_tokens")?.as_u64()? as u32,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        let body = self.build_chat_body(req);

        tracing::debug!(provider = %self.id, url = %url, "openai_compat chat request");

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
                status: Some(status.as_u16()),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&self.id, &resp_json)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::with_api_key(&LlmConfig::default(), "gsk-test".into()).unwrap()
    }

    fn sql_tool() -> ToolDefinition {
        ToolDefinition {
            name: "run_database_call".into(),
            description: "Run a read-only SQL query".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "sql_query": { "type": "string" } },
                "required": ["sql_query"]
            }),
        }
    }

    #[test]
    fn body_carries_model_tools_and_caps() {
        let req = ChatRequest {
            messages: vec![Message::system("sys"), Message::human("How many students?")],
            tools: vec![sql_tool()],
            temperature: Some(0.0),
            max_tokens: Some(250),
            model: None,
        };
        let body = provider().build_chat_body(&req);
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["max_tokens"], 250);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["tools"][0]["function"]["name"], "run_database_call");
    }

    #[test]
    fn body_omits_tools_and_cap_when_unset() {
        let req = ChatRequest {
            messages: vec![Message::human("hi")],
            ..Default::default()
        };
        let body = provider().build_chat_body(&req);
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn ai_tool_call_and_tool_result_serialize_as_pair() {
        let call = ToolCall {
            call_id: "call_7".into(),
            tool_name: "run_database_call".into(),
            arguments: serde_json::json!({ "sql_query": "SELECT 1" }),
        };
        let ai = msg_to_openai(&Message::ai_with_tool_calls("", vec![call]));
        assert_eq!(ai["role"], "assistant");
        assert!(ai["content"].is_null());
        assert_eq!(ai["tool_calls"][0]["id"], "call_7");
        assert_eq!(
            ai["tool_calls"][0]["function"]["arguments"],
            "{\"sql_query\":\"SELECT 1\"}"
        );

        let tool = msg_to_openai(&Message::tool_result("call_7", "[{\"1\":1}]"));
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_7");
    }

    #[test]
    fn parses_tool_call_response() {
        let body = serde_json::json!({
            "model": "llama3-8b-8192",
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "run_database_call",
                            "arguments": "{\"sql_query\":\"SELECT COUNT(*) FROM students\"}"
                        }
                    }]
                }
            }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 20, "total_tokens": 140 }
        });
        let resp = parse_chat_response("groq", &body).unwrap();
        assert_eq!(resp.content, "");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(
            resp.tool_calls[0].arguments["sql_query"],
            "SELECT COUNT(*) FROM students"
        );
        assert_eq!(resp.usage.unwrap().total_tokens, 140);
        assert_eq!(resp.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn parses_plain_answer() {
        let body = serde_json::json!({
            "model": "llama3-8b-8192",
            "choices": [{ "finish_reason": "stop", "message": { "role": "assistant", "content": "Hello!" } }]
        });
        let resp = parse_chat_response("groq", &body).unwrap();
        assert_eq!(resp.content, "Hello!");
        assert!(resp.tool_calls.is_empty());
        assert!(resp.usage.is_none());
    }

    #[test]
    fn unparseable_arguments_are_kept_as_string() {
        let message = serde_json::json!({
            "tool_calls": [{
                "id": "c1",
                "function": { "name": "run_database_call", "arguments": "SELECT 1" }
            }]
        });
        let calls = parse_openai_tool_calls(&message);
        assert_eq!(calls[0].arguments, Value::String("SELECT 1".into()));
    }

    #[test]
    fn empty_choices_is_a_provider_error() {
        let err = parse_chat_response("groq", &serde_json::json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, Error::Provider { status: None, .. }));
        assert!(!err.is_retryable());
    }
}
