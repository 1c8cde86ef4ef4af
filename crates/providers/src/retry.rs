//! Bounded retry around a single model invocation.

use std::time::{Duration, Instant};

use sq_domain::error::{Error, Result};
use sq_domain::trace::TraceEvent;

use crate::traits::{ChatRequest, ChatResponse, LlmProvider};

const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Delay before retry number `attempt` (1-based): doubling from 100ms,
/// capped at 10s.
fn backoff(attempt: u32) -> Duration {
    let ms = 2u64
        .saturating_pow(attempt.saturating_sub(1))
        .saturating_mul(BASE_BACKOFF_MS)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// Call `provider.chat(req)`, retrying transient failures.
///
/// At most `max_retries` extra attempts are made, with exponential backoff
/// starting at 100ms and capped at 10s. Only errors for which [`Error::is_retryable`] holds
/// are retried; a 4xx or a malformed response fails immediately. Every
/// attempt emits an `LlmRequest` trace event tagged with `node`.
pub async fn chat_with_retry(
    provider: &dyn LlmProvider,
    req: &ChatRequest,
    max_retries: u32,
    node: &str,
) -> Result<ChatResponse> {
    let mut last_err: Option<Error> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff(attempt)).await;
        }

        let start = Instant::now();
        let result = provider.chat(req).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let usage = result.as_ref().ok().and_then(|r| r.usage);
        TraceEvent::LlmRequest {
            provider: provider.provider_id().to_string(),
            model: req
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            node: node.to_string(),
            tools_bound: req.tools.len(),
            attempt: attempt.saturating_add(1),
            duration_ms,
            prompt_tokens: usage.map(|u| u.prompt_tokens),
            completion_tokens: usage.map(|u| u.completion_tokens),
        }
        .emit();

        match result {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                tracing::warn!(
                    provider = %provider.provider_id(),
                    node,
                    attempt = attempt.saturating_add(1),
                    error = %e,
                    "model call failed, retrying"
                );
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| Error::Other("model call retries exhausted".into())))
}
