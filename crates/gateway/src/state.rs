use std::sync::Arc;

use sq_database::SchemaIntrospector;
use sq_domain::config::Config;
use sq_sessions::ConversationStore;

use crate::runtime::TurnRunner;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub turns: Arc<TurnRunner>,
    /// Same introspector the agent node uses, for `GET /v1/schema`.
    pub schema: Arc<SchemaIntrospector>,
    /// SHA-256 of the API token; `None` disables auth (dev mode).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn sessions(&self) -> &Arc<dyn ConversationStore> {
        self.turns.store()
    }
}
