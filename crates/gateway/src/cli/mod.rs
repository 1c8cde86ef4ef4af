pub mod chat;
pub mod config;
pub mod doctor;
pub mod run;

use clap::{Parser, Subcommand};

/// sqlagent: answer questions about a SQL database in natural language.
#[derive(Debug, Parser)]
#[command(name = "sqlagent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Ask a single question and print the answer.
    Run {
        /// The question to ask.
        message: String,
        /// Conversation to continue.
        #[arg(long, default_value = "cli-run")]
        session: String,
        /// Print the committed messages as JSON instead of the answer.
        #[arg(long)]
        json: bool,
    },
    /// Interactive question-and-answer session.
    Chat {
        /// Conversation to start in.
        #[arg(long, default_value = "cli-chat")]
        session: String,
    },
    /// Check the API key, database connectivity and schema.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `SQA_CONFIG` (or `config.toml`).
/// A missing file means all defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(sq_domain::config::Config, String)> {
    let config_path = std::env::var("SQA_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<sq_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(sq_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 3210);
    }

    #[test]
    fn reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_result_rows = 50\n").unwrap();
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.agent.max_result_rows, 50);
        assert_eq!(config.llm.agent_max_tokens, 250);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\n").unwrap();
        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn run_defaults_to_cli_session() {
        let cli = Cli::parse_from(["sqlagent", "run", "How many students?"]);
        match cli.command {
            Some(Command::Run { message, session, json }) => {
                assert_eq!(message, "How many students?");
                assert_eq!(session, "cli-run");
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["sqlagent"]);
        assert!(cli.command.is_none());
    }
}
