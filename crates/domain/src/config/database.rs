use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Relational store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where to find the database credentials.
///
/// Each credential is read from the environment variable named by the
/// matching `*_env` field. A literal value in the config file (`host`,
/// `port`, ...) takes precedence over the environment. The password has no
/// literal form on purpose: it only ever comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "d_host_env")]
    pub host_env: String,
    #[serde(default = "d_port_env")]
    pub port_env: String,
    #[serde(default = "d_name_env")]
    pub name_env: String,
    #[serde(default = "d_user_env")]
    pub user_env: String,
    #[serde(default = "d_password_env")]
    pub password_env: String,

    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,

    /// Schemas never shown to the model.
    #[serde(default = "d_excluded_schemas")]
    pub excluded_schemas: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host_env: d_host_env(),
            port_env: d_port_env(),
            name_env: d_name_env(),
            user_env: d_user_env(),
            password_env: d_password_env(),
            host: None,
            port: None,
            name: None,
            user: None,
            excluded_schemas: d_excluded_schemas(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_host_env() -> String {
    "DB_HOST".into()
}
fn d_port_env() -> String {
    "DB_PORT".into()
}
fn d_name_env() -> String {
    "DB_NAME".into()
}
fn d_user_env() -> String {
    "DB_USER".into()
}
fn d_password_env() -> String {
    "DB_PASSWORD".into()
}

/// MySQL's own catalogs.
pub fn d_excluded_schemas() -> Vec<String> {
    vec![
        "information_schema".into(),
        "mysql".into(),
        "performance_schema".into(),
        "sys".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_env_names() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.host_env, "DB_HOST");
        assert_eq!(cfg.port_env, "DB_PORT");
        assert_eq!(cfg.name_env, "DB_NAME");
        assert_eq!(cfg.user_env, "DB_USER");
        assert_eq!(cfg.password_env, "DB_PASSWORD");
    }

    #[test]
    fn default_excludes_mysql_system_schemas() {
        let cfg = DatabaseConfig::default();
        for schema in ["information_schema", "mysql", "performance_schema", "sys"] {
            assert!(cfg.excluded_schemas.iter().any(|s| s == schema), "{schema}");
        }
    }

    #[test]
    fn literal_overrides_parse() {
        let cfg: DatabaseConfig = toml::from_str(
            r#"
            host = "db.internal"
            port = 3307
            "#,
        )
        .unwrap();
        assert_eq!(cfg.host.as_deref(), Some("db.internal"));
        assert_eq!(cfg.port, Some(3307));
        assert_eq!(cfg.password_env, "DB_PASSWORD");
    }
}
