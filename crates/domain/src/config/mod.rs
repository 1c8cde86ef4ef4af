mod agent;
mod database;
mod llm;
mod observability;
mod server;
mod sessions;

pub use agent::*;
pub use database::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound accepted for `llm.max_retries`.
pub const MAX_LLM_RETRIES: u32 = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the static shape of the configuration.
    ///
    /// Secrets and database credentials are resolved at startup rather than
    /// here, since they live in the environment.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "base_url must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(ConfigError::error(
                "llm.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }
        if self.llm.temperature != 0.0 {
            errors.push(ConfigError::warning(
                "llm.temperature",
                "non-zero temperature makes tool selection non-deterministic",
            ));
        }
        if self.llm.agent_max_tokens == 0 {
            errors.push(ConfigError::error(
                "llm.agent_max_tokens",
                "agent_max_tokens must be greater than 0",
            ));
        }
        if self.llm.max_retries > MAX_LLM_RETRIES {
            errors.push(ConfigError::error(
                "llm.max_retries",
                format!("max_retries must be at most {MAX_LLM_RETRIES}"),
            ));
        }

        if self.agent.turn_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "agent.turn_timeout_ms",
                "turn_timeout_ms must be greater than 0",
            ));
        }
        if self.agent.max_result_rows == 0 {
            errors.push(ConfigError::error(
                "agent.max_result_rows",
                "max_result_rows must be greater than 0",
            ));
        }

        if self.sessions.backend == SessionBackend::File
            && self.sessions.state_path.as_os_str().is_empty()
        {
            errors.push(ConfigError::error(
                "sessions.state_path",
                "state_path is required for the file backend",
            ));
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }

    /// True when `validate` reported at least one error-level issue.
    pub fn has_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|e| e.severity == ConfigSeverity::Error)
    }
}
