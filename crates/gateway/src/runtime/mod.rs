//! Turn execution: take a session's history and a new question, walk the
//! graph, and commit the result to the conversation store.
//!
//! Entry point: [`TurnRunner::run_turn`].

pub(crate) mod nodes;
pub mod prompt;
pub mod session_lock;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use sq_database::SchemaIntrospector;
use sq_domain::config::Config;
use sq_domain::error::Error;
use sq_domain::tool::{Message, Role};
use sq_domain::trace::TraceEvent;
use sq_providers::LlmProvider;
use sq_sessions::{validate_session_key, ConversationStore};
use sq_tools::ToolRegistry;

use crate::graph::{self, Node};
use nodes::NodeContext;
use session_lock::SessionLockMap;

/// Reply committed when a model call or the schema lookup failed.
pub const FAILED_TURN_REPLY: &str =
    "Sorry, I could not process your question right now. Please try again.";

/// Reply committed when the turn ran out of time.
pub const TIMED_OUT_REPLY: &str =
    "Sorry, answering your question took too long. Please try again.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Settings, outcome, errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-turn knobs, lifted out of [`Config`].
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub temperature: f32,
    pub agent_max_tokens: u32,
    pub generate_max_tokens: Option<u32>,
    pub max_retries: u32,
    pub turn_timeout: Duration,
}

impl TurnSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.llm.temperature,
            agent_max_tokens: config.llm.agent_max_tokens,
            generate_max_tokens: config.llm.generate_max_tokens,
            max_retries: config.llm.max_retries,
            turn_timeout: Duration::from_millis(config.agent.turn_timeout_ms),
        }
    }
}

/// What a turn committed.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_key: String,
    /// The messages appended to the conversation, human message first.
    pub messages: Vec<Message>,
    /// Content of the final AI message.
    pub answer: String,
    pub used_tool: bool,
    /// Why the turn fell back to an apology, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Failures that leave the conversation untouched.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("invalid session key: {0}")]
    InvalidSessionKey(String),

    #[error("message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Busy(#[from] session_lock::SessionBusy),

    #[error("conversation store: {0}")]
    Store(Error),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TurnRunner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TurnRunner {
    provider: Arc<dyn LlmProvider>,
    schema: Arc<SchemaIntrospector>,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn ConversationStore>,
    locks: Arc<SessionLockMap>,
    settings: TurnSettings,
}

impl TurnRunner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        schema: Arc<SchemaIntrospector>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            provider,
            schema,
            tools,
            store,
            locks: Arc::new(SessionLockMap::new()),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn locks(&self) -> &Arc<SessionLockMap> {
        &self.locks
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Answer `text` within the conversation named `session_key`.
    ///
    /// The history is read and the new messages are appended under the
    /// session's lock, so turns on one session never interleave. Nothing is
    /// written until the turn is over: dropping the future commits nothing.
    ///
    /// A model, schema or timeout failure still commits the human message
    /// plus an apology, and is reported through [`TurnOutcome::error`].
    pub async fn run_turn(&self, session_key: &str, text: &str) -> Result<TurnOutcome, TurnError> {
        validate_session_key(session_key)
            .map_err(|e| TurnError::InvalidSessionKey(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let _permit = self.locks.acquire(session_key).await?;
        let start = Instant::now();

        let history = self.store.history(session_key).await.map_err(TurnError::Store)?;
        let human = Message::human(text);

        let walked = tokio::time::timeout(
            self.settings.turn_timeout,
            self.walk(history, human.clone()),
        )
        .await;

        let (produced, error) = match walked {
            Ok(Ok(produced)) => (produced, None),
            Ok(Err(e)) => {
                tracing::warn!(session_key, error = %e, "turn failed");
                (vec![Message::ai(FAILED_TURN_REPLY)], Some(e.to_string()))
            }
            Err(_) => {
                let ms = self.settings.turn_timeout.as_millis();
                tracing::warn!(session_key, timeout_ms = ms as u64, "turn timed out");
                (
                    vec![Message::ai(TIMED_OUT_REPLY)],
                    Some(format!("turn exceeded {ms}ms")),
                )
            }
        };

        let mut committed = Vec::with_capacity(produced.len() + 1);
        committed.push(human);
        committed.extend(produced);
        self.store
            .append(session_key, &committed)
            .await
            .map_err(TurnError::Store)?;

        let used_tool = committed.iter().any(|m| m.role == Role::Tool);
        let answer = committed
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        TraceEvent::TurnCompleted {
            session_key: session_key.to_owned(),
            used_tool,
            appended: committed.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            outcome: if error.is_none() { "ok" } else { "failed" }.into(),
        }
        .emit();

        Ok(TurnOutcome {
            session_key: session_key.to_owned(),
            messages: committed,
            answer,
            used_tool,
            error,
        })
    }

    /// Walk the graph from `start` to `end`, returning what the nodes
    /// produced after `human`.
    async fn walk(&self, history: Vec<Message>, human: Message) -> Result<Vec<Message>, Error> {
        let ctx = NodeContext {
            provider: self.provider.as_ref(),
            schema: self.schema.as_ref(),
            tools: self.tools.as_ref(),
            settings: &self.settings,
        };

        let mut working = history;
        working.push(human);
        let first_new = working.len();

        let mut node = Node::Start;
        loop {
            node = graph::next(node, &working);
            tracing::debug!(node = node.as_str(), "entering node");
            match node {
                Node::Agent => {
                    let msg = nodes::decide(&ctx, &working).await?;
                    working.push(msg);
                }
                Node::Retrieve => {
                    let results = nodes::retrieve(&ctx, &working).await;
                    working.extend(results);
                }
                Node::Generate => {
                    let msg = nodes::generate(&ctx, &working).await?;
                    working.push(msg);
                }
                Node::Start | Node::End => break,
            }
        }

        Ok(working.split_off(first_new))
    }
}
