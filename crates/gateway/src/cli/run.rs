//! `sqlagent run` — ask one question and exit.

use sq_domain::config::Config;
use sq_domain::tool::Message;

use crate::bootstrap;

/// Exits non-zero when the turn fell back to an apology.
pub async fn run(
    config: Config,
    message: String,
    session_key: String,
    json_output: bool,
) -> anyhow::Result<()> {
    let (runner, _schema) = bootstrap::build_runner(&config)?;
    let outcome = runner.run_turn(&session_key, &message).await?;

    if json_output {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| anyhow::anyhow!("serializing outcome: {e}"))?;
        println!("{json}");
    } else {
        print_sql(&outcome.messages);
        println!("{}", outcome.answer);
    }

    if let Some(error) = &outcome.error {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    Ok(())
}

/// Show the SQL the model ran, dimmed on stderr so stdout stays clean.
pub(crate) fn print_sql(messages: &[Message]) {
    for call in messages.iter().flat_map(|m| &m.tool_calls) {
        let sql = call
            .arguments
            .get("sql_query")
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        eprintln!("\x1b[2m[{}] {sql}\x1b[0m", call.tool_name);
    }
}
