use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Language model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for the OpenAI-compatible chat completions endpoint.
///
/// One provider serves both model passes of a turn. The decision pass is
/// capped at `agent_max_tokens` (it should emit a short tool call or a
/// short direct answer); the generation pass uses `generate_max_tokens`,
/// which is uncapped by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Identifier used in logs and trace events.
    #[serde(default = "d_provider_id")]
    pub provider_id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "d_250")]
    pub agent_max_tokens: u32,
    #[serde(default)]
    pub generate_max_tokens: Option<u32>,
    /// Per-request HTTP timeout.
    #[serde(default = "d_60000")]
    pub timeout_ms: u64,
    /// Extra attempts after a transient failure (timeouts, 429, 5xx).
    #[serde(default = "d_2")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_id: d_provider_id(),
            base_url: d_base_url(),
            auth: AuthConfig::default(),
            model: d_model(),
            temperature: 0.0,
            agent_max_tokens: 250,
            generate_max_tokens: None,
            timeout_ms: 60_000,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default = "d_api_key_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "sqlagent").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "groq-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: None,
            prefix: None,
            env: d_api_key_env(),
            key: None,
            service: None,
            account: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "groq".into()
}
fn d_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn d_model() -> String {
    "llama3-8b-8192".into()
}
fn d_api_key_env() -> Option<String> {
    Some("API_KEY".into())
}
fn d_250() -> u32 {
    250
}
fn d_60000() -> u64 {
    60_000
}
fn d_2() -> u32 {
    2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
