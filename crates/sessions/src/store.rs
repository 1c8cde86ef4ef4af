//! The conversation store seam and its in-process implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use sq_domain::error::Result;
use sq_domain::tool::Message;
use sq_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Listing entry for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_key: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only message log keyed by session.
///
/// A key that was never appended to has an empty history. Implementations
/// must allow concurrent appends to different keys; callers serialize
/// appends to the same key.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn history(&self, session_key: &str) -> Result<Vec<Message>>;

    async fn append(&self, session_key: &str, messages: &[Message]) -> Result<()>;

    /// Known conversations, most recently updated first.
    async fn list(&self) -> Result<Vec<SessionSummary>>;
}

pub(crate) fn emit_append(session_key: &str, count: usize, is_new: bool) {
    if is_new {
        TraceEvent::SessionResolved {
            session_key: session_key.to_owned(),
            is_new: true,
        }
        .emit();
    }
    TraceEvent::MessagesAppended {
        session_key: session_key.to_owned(),
        count,
    }
    .emit();
}

pub(crate) fn sort_recent_first(summaries: &mut [SessionSummary]) {
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.session_key.cmp(&b.session_key))
    });
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct SessionLog {
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Volatile store; everything is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryStore {
    async fn history(&self, session_key: &str) -> Result<Vec<Message>> {
        Ok(self
            .sessions
            .read()
            .get(session_key)
            .map(|log| log.messages.clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_key: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let is_new = {
            let mut sessions = self.sessions.write();
            let is_new = !sessions.contains_key(session_key);
            let log = sessions
                .entry(session_key.to_owned())
                .or_insert_with(|| SessionLog {
                    messages: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
            log.messages.extend_from_slice(messages);
            log.updated_at = now;
            is_new
        };

        emit_append(session_key, messages.len(), is_new);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut out: Vec<SessionSummary> = self
            .sessions
            .read()
            .iter()
            .map(|(key, log)| SessionSummary {
                session_key: key.clone(),
                message_count: log.messages.len(),
                created_at: log.created_at,
                updated_at: log.updated_at,
            })
            .collect();
        sort_recent_first(&mut out);
        Ok(out)
    }
}
