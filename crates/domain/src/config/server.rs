use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3210")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Environment variable holding the bearer token for the `/v1` routes.
    /// When unset or empty the server warns and serves them unauthenticated.
    #[serde(default = "d_api_token_env")]
    pub api_token_env: String,
    /// Per-IP token bucket. Disabled when absent.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// Upper bound on requests in flight across the whole server.
    #[serde(default = "d_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3210,
            host: d_host(),
            cors: CorsConfig::default(),
            api_token_env: d_api_token_env(),
            rate_limit: None,
            max_concurrent_requests: d_max_concurrent_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// One token is added every `1 / requests_per_second` seconds.
    pub requests_per_second: u64,
    /// Bucket capacity.
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. A trailing `:*` matches any port on that host.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3210() -> u16 {
    3210
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_api_token_env() -> String {
    "SQA_API_TOKEN".into()
}
fn d_max_concurrent_requests() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.port, 3210);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.api_token_env, "SQA_API_TOKEN");
        assert_eq!(cfg.max_concurrent_requests, 64);
        assert!(cfg.rate_limit.is_none());
    }

    #[test]
    fn rate_limit_section_parses() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            port = 8080

            [rate_limit]
            requests_per_second = 5
            burst_size = 10
            "#,
        )
        .unwrap();
        let rl = cfg.rate_limit.expect("rate_limit");
        assert_eq!(cfg.port, 8080);
        assert_eq!(rl.requests_per_second, 5);
        assert_eq!(rl.burst_size, 10);
    }

    #[test]
    fn cors_defaults_to_loopback_any_port() {
        let cfg = CorsConfig::default();
        assert_eq!(
            cfg.allowed_origins,
            vec!["http://localhost:*", "http://127.0.0.1:*"]
        );
    }
}
