//! Conversation state for sqlagent.
//!
//! A conversation is an append-only list of messages addressed by a session
//! key. Two interchangeable stores implement [`ConversationStore`]: a
//! volatile in-process map and a JSONL transcript directory.

pub mod session_key;
pub mod store;
pub mod transcript;

use std::sync::Arc;

use sq_domain::config::{SessionBackend, SessionsConfig};
use sq_domain::error::Result;

pub use session_key::{new_session_key, validate_session_key};
pub use store::{ConversationStore, InMemoryStore, SessionSummary};
pub use transcript::FileStore;

/// Build the store selected by `[sessions].backend`.
pub fn open_store(cfg: &SessionsConfig) -> Result<Arc<dyn ConversationStore>> {
    match cfg.backend {
        SessionBackend::Memory => {
            tracing::info!("conversation store: in-memory");
            Ok(Arc::new(InMemoryStore::new()))
        }
        SessionBackend::File => {
            let store = FileStore::new(&cfg.state_path)?;
            tracing::info!(path = %cfg.state_path.display(), "conversation store: jsonl");
            Ok(Arc::new(store))
        }
    }
}
