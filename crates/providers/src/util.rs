//! Shared helpers for provider adapters.

use sq_domain::config::AuthConfig;
use sq_domain::error::{Error, Result};

/// Timeouts map to [`Error::Timeout`]; everything else to [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the model API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` in the OS keychain
/// 3. `env` field
/// 4. `{SERVICE}_{ACCOUNT}` env var when keychain fields are set
/// 5. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!("API key loaded from plaintext config field 'key', prefer 'env' or keychain");
        return Ok(key.clone());
    }

    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(secret),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = auth.env {
        match std::env::var(env_var) {
            Ok(val) if !val.is_empty() => return Ok(val),
            _ if auth.service.is_none() => {
                return Err(Error::Auth(format!(
                    "environment variable '{env_var}' not set or empty"
                )));
            }
            _ => {}
        }
    }

    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Ok(val) = std::env::var(&fallback_var) {
            tracing::info!(env_var = %fallback_var, "API key resolved from keychain fallback env var");
            return Ok(val);
        }
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or keychain 'service'+'account' under [llm.auth]"
            .into(),
    ))
}

/// Read a secret from the platform credential store.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// `("sqlagent", "groq-api-key")` becomes `"SQLAGENT_GROQ_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}
