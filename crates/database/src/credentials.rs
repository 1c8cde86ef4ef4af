use std::fmt;

use sq_domain::config::DatabaseConfig;
use sq_domain::error::{Error, Result};

/// Connection parameters for the relational store.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    password: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DbCredentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Resolve from the process environment.
    pub fn from_config(cfg: &DatabaseConfig) -> Result<Self> {
        Self::resolve_with(cfg, |name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` in place of the environment.
    ///
    /// Every missing setting is reported in a single [`Error::Config`]. An
    /// empty password is accepted; an unset one is not.
    pub fn resolve_with(
        cfg: &DatabaseConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut missing: Vec<&str> = Vec::new();

        let text = |literal: &Option<String>, env: &str| -> Option<String> {
            literal
                .clone()
                .or_else(|| lookup(env).filter(|v| !v.is_empty()))
        };
        let host = text(&cfg.host, &cfg.host_env);
        let database = text(&cfg.name, &cfg.name_env);
        let user = text(&cfg.user, &cfg.user_env);
        for (value, env) in [
            (&host, &cfg.host_env),
            (&database, &cfg.name_env),
            (&user, &cfg.user_env),
        ] {
            if value.is_none() {
                missing.push(env);
            }
        }

        let port = match cfg.port {
            Some(p) => Some(p),
            None => match lookup(&cfg.port_env).filter(|v| !v.is_empty()) {
                Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                    Error::Config(format!("{} is not a valid port: {raw:?}", cfg.port_env))
                })?),
                None => None,
            },
        };
        if port.is_none() {
            missing.push(&cfg.port_env);
        }

        let password = lookup(&cfg.password_env);
        if password.is_none() {
            missing.push(&cfg.password_env);
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing database settings: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            host: host.unwrap_or_default(),
            port: port.unwrap_or_default(),
            database: database.unwrap_or_default(),
            user: user.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "3306"),
            ("DB_NAME", "school"),
            ("DB_USER", "reader"),
            ("DB_PASSWORD", "hunter2"),
        ])
    }

    #[test]
    fn resolves_from_environment() {
        let vars = full_env();
        let creds =
            DbCredentials::resolve_with(&DatabaseConfig::default(), |k| vars.get(k).cloned())
                .unwrap();
        assert_eq!(creds.host, "localhost");
        assert_eq!(creds.port, 3306);
        assert_eq!(creds.database, "school");
        assert_eq!(creds.user, "reader");
        assert_eq!(creds.password(), "hunter2");
    }

    #[test]
    fn literal_values_override_environment() {
        let vars = full_env();
        let cfg = DatabaseConfig {
            host: Some("db.internal".into()),
            port: Some(3307),
            ..Default::default()
        };
        let creds = DbCredentials::resolve_with(&cfg, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.host, "db.internal");
        assert_eq!(creds.port, 3307);
    }

    #[test]
    fn all_missing_settings_are_listed() {
        let vars = env(&[("DB_HOST", "localhost"), ("DB_PORT", "3306")]);
        let err = DbCredentials::resolve_with(&DatabaseConfig::default(), |k| vars.get(k).cloned())
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Config(_)));
        assert!(msg.contains("DB_NAME"));
        assert!(msg.contains("DB_USER"));
        assert!(msg.contains("DB_PASSWORD"));
        assert!(!msg.contains("DB_HOST"));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut vars = full_env();
        vars.insert("DB_PORT".into(), "mysql".into());
        let err = DbCredentials::resolve_with(&DatabaseConfig::default(), |k| vars.get(k).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("not a valid port"));
    }

    #[test]
    fn empty_password_is_allowed() {
        let mut vars = full_env();
        vars.insert("DB_PASSWORD".into(), String::new());
        let creds =
            DbCredentials::resolve_with(&DatabaseConfig::default(), |k| vars.get(k).cloned())
                .unwrap();
        assert_eq!(creds.password(), "");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = DbCredentials::new("h", 3306, "d", "u", "secret-pw");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret-pw"));
        assert!(dbg.contains("<redacted>"));
    }
}
