//! The three working nodes of a turn.
//!
//! Each node reads the working message list and returns the messages it
//! contributes; none of them touch the conversation store.

use sq_database::SchemaIntrospector;
use sq_domain::error::{Error, Result};
use sq_domain::tool::{last_human, last_tool_result, Message};
use sq_providers::{chat_with_retry, ChatRequest, LlmProvider};
use sq_tools::ToolRegistry;

use super::prompt;
use super::TurnSettings;

/// Everything a node may call out to.
pub(crate) struct NodeContext<'a> {
    pub provider: &'a dyn LlmProvider,
    pub schema: &'a SchemaIntrospector,
    pub tools: &'a ToolRegistry,
    pub settings: &'a TurnSettings,
}

fn current_question(messages: &[Message]) -> Result<&Message> {
    last_human(messages).ok_or_else(|| Error::Other("no human message in the turn".into()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// agent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decide between answering directly and querying the database.
///
/// The model sees only the schema-grounded system prompt and the current
/// question; earlier turns are not replayed.
pub(crate) async fn decide(ctx: &NodeContext<'_>, messages: &[Message]) -> Result<Message> {
    let schema = ctx.schema.fetch_schema().await?;
    let question = current_question(messages)?;

    let req = ChatRequest {
        messages: vec![
            Message::system(prompt::decision_system_prompt(&schema)),
            question.clone(),
        ],
        tools: ctx.tools.definitions(),
        temperature: Some(ctx.settings.temperature),
        max_tokens: Some(ctx.settings.agent_max_tokens),
        model: None,
    };

    let resp = chat_with_retry(ctx.provider, &req, ctx.settings.max_retries, "agent").await?;
    tracing::debug!(
        tool_calls = resp.tool_calls.len(),
        finish_reason = ?resp.finish_reason,
        "agent decided"
    );
    Ok(resp.into_message())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// retrieve
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run every tool call on the last message, one tool message per call.
///
/// Never fails: tool errors are already text by the time they get here.
pub(crate) async fn retrieve(ctx: &NodeContext<'_>, messages: &[Message]) -> Vec<Message> {
    let Some(request) = messages.last() else {
        return Vec::new();
    };

    let mut results = Vec::with_capacity(request.tool_calls.len());
    for call in &request.tool_calls {
        let output = ctx.tools.dispatch(call).await;
        tracing::debug!(
            tool = %call.tool_name,
            call_id = %call.call_id,
            is_error = output.is_error,
            "tool call finished"
        );
        results.push(Message::tool_result(&call.call_id, output.content));
    }
    results
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Phrase the final answer from the question and the query result.
pub(crate) async fn generate(ctx: &NodeContext<'_>, messages: &[Message]) -> Result<Message> {
    let question = current_question(messages)?;
    let data = last_tool_result(messages)
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    let req = ChatRequest {
        messages: vec![
            Message::system(prompt::SYSTEM_PREAMBLE),
            Message::human(prompt::generation_prompt(&question.content, data)),
        ],
        tools: Vec::new(),
        temperature: Some(ctx.settings.temperature),
        max_tokens: ctx.settings.generate_max_tokens,
        model: None,
    };

    let resp = chat_with_retry(ctx.provider, &req, ctx.settings.max_retries, "generate").await?;
    Ok(Message::ai(resp.content))
}
