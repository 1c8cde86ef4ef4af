use sq_domain::config::{Config, SessionBackend};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn empty_file_is_a_complete_config() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.server.port, 3210);
    assert_eq!(config.llm.model, "llama3-8b-8192");
    assert_eq!(config.database.host_env, "DB_HOST");
    assert_eq!(config.sessions.backend, SessionBackend::Memory);
    assert!(!config.has_errors());
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    let origins = &config.server.cors.allowed_origins;
    assert!(origins.contains(&"http://localhost:*".to_string()));
    assert!(origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn cors_config_parses_custom_origins() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["https://reports.example.com", "http://localhost:3000"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.cors.allowed_origins.len(), 2);
}

#[test]
fn cors_wildcard_is_a_warning_not_an_error() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["*"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|e| e.field == "server.cors.allowed_origins"));
    assert!(!config.has_errors());
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
port = 8088

[llm]
model = "llama3-70b-8192"
agent_max_tokens = 300

[database]
host = "db.internal"
port = 3306

[agent]
turn_timeout_ms = 30000
max_result_rows = 50

[sessions]
backend = "file"
state_path = "/tmp/sqlagent-sessions"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.llm.agent_max_tokens, 300);
    assert_eq!(config.database.host.as_deref(), Some("db.internal"));
    assert_eq!(config.agent.turn_timeout_ms, 30_000);
    assert_eq!(config.agent.max_result_rows, 50);
    assert_eq!(config.sessions.backend, SessionBackend::File);
    assert!(!config.has_errors(), "{:?}", config.validate());
}

#[test]
fn zero_result_row_cap_is_rejected() {
    let toml_str = r#"
[agent]
max_result_rows = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.has_errors());
}

#[test]
fn api_token_env_default() {
    let config = Config::default();
    assert_eq!(config.server.api_token_env, "SQA_API_TOKEN");
}
