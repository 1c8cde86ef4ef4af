//! Runtime construction shared by `serve`, `run`, `chat` and `doctor`.
//!
//! Everything that can be missing at startup (API key, database
//! credentials, an unusable config) fails here, before any turn runs.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use sq_database::{DbCredentials, MySqlExecutor, QueryExecutor, SchemaIntrospector};
use sq_domain::config::{Config, ConfigSeverity};
use sq_providers::{LlmProvider, OpenAiCompatProvider};
use sq_tools::{RunDatabaseCall, ToolRegistry};

use crate::runtime::{TurnRunner, TurnSettings};
use crate::state::AppState;

/// Log every config issue and bail if any is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// The database executor described by `[database]` and the environment.
pub fn build_executor(config: &Config) -> anyhow::Result<Arc<dyn QueryExecutor>> {
    let creds = DbCredentials::from_config(&config.database)
        .context("resolving database credentials")?;
    tracing::info!(
        host = %creds.host,
        port = creds.port,
        database = %creds.database,
        "database configured"
    );
    Ok(Arc::new(MySqlExecutor::new(&creds)))
}

/// Validate config and wire the provider, database, tools and store into
/// a [`TurnRunner`].
pub fn build_runner(config: &Config) -> anyhow::Result<(Arc<TurnRunner>, Arc<SchemaIntrospector>)> {
    check_config(config)?;

    // ── LLM provider ─────────────────────────────────────────────────
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm).context("initializing LLM provider")?,
    );
    tracing::info!(
        provider = provider.provider_id(),
        model = provider.default_model(),
        "LLM provider ready"
    );

    // ── Database + schema ────────────────────────────────────────────
    let executor = build_executor(config)?;
    let schema = Arc::new(SchemaIntrospector::new(
        executor.clone(),
        config.database.excluded_schemas.clone(),
    ));

    // ── Tools ────────────────────────────────────────────────────────
    let tools = Arc::new(ToolRegistry::new().register(Arc::new(RunDatabaseCall::new(
        executor,
        config.agent.max_result_rows,
    ))));
    tracing::info!(tools = tools.len(), "tool registry ready");

    // ── Conversation store ───────────────────────────────────────────
    let store = sq_sessions::open_store(&config.sessions).context("opening conversation store")?;

    let runner = Arc::new(TurnRunner::new(
        provider,
        schema.clone(),
        tools,
        store,
        TurnSettings::from_config(config),
    ));
    Ok((runner, schema))
}

/// Build the full HTTP server state.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let (turns, schema) = build_runner(&config)?;
    let api_token_hash = api_token_hash(&config.server.api_token_env, |name| std::env::var(name).ok());

    Ok(AppState {
        config,
        turns,
        schema,
        api_token_hash,
    })
}

/// Read the API token once and keep only its digest.
pub fn api_token_hash(env_var: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<Vec<u8>> {
    match lookup(env_var).filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::info!(source = %format!("env:{env_var}"), "API bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!("API bearer-token auth DISABLED, set the {env_var} env var to enable it");
            None
        }
    }
}

/// Spawn the server's housekeeping loops.
pub fn spawn_background_tasks(state: &AppState) {
    let locks = state.turns.locks().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let pruned = locks.prune_idle();
            if pruned > 0 {
                tracing::debug!(pruned, "pruned idle session locks");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_hashed() {
        let hash = api_token_hash("SQA_API_TOKEN", |_| Some("secret".into())).unwrap();
        assert_eq!(hash, Sha256::digest(b"secret").to_vec());
    }

    #[test]
    fn empty_or_missing_token_disables_auth() {
        assert!(api_token_hash("SQA_API_TOKEN", |_| Some(String::new())).is_none());
        assert!(api_token_hash("SQA_API_TOKEN", |_| None).is_none());
    }

    #[test]
    fn invalid_config_is_fatal() {
        let mut config = Config::default();
        config.agent.max_result_rows = 0;
        assert!(check_config(&config).is_err());
        assert!(check_config(&Config::default()).is_ok());
    }
}
