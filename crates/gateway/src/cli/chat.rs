//! `sqlagent chat` — interactive REPL.
//!
//! Each line is one turn in the current session. Slash-commands switch
//! sessions and show history.

use sq_domain::config::Config;
use sq_domain::tool::Role;
use sq_sessions::{new_session_key, validate_session_key};

use crate::bootstrap;
use crate::runtime::TurnRunner;

use super::run::print_sql;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: Config, mut session_key: String) -> anyhow::Result<()> {
    validate_session_key(&session_key)?;
    let (runner, _schema) = bootstrap::build_runner(&config)?;

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".sqlagent")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("sqlagent interactive chat");
    eprintln!("Session: {session_key}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    match handle_slash_command(trimmed, &mut session_key) {
                        SlashAction::Exit => break,
                        SlashAction::ShowHistory => show_history(&runner, &session_key).await,
                        SlashAction::Continue => {}
                    }
                    continue;
                }

                match runner.run_turn(&session_key, trimmed).await {
                    Ok(outcome) => {
                        print_sql(&outcome.messages);
                        println!("{}\n", outcome.answer);
                        if let Some(error) = outcome.error {
                            eprintln!("\x1B[31merror: {error}\x1B[0m");
                        }
                    }
                    Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, PartialEq, Eq)]
enum SlashAction {
    Continue,
    ShowHistory,
    Exit,
}

fn handle_slash_command(input: &str, session_key: &mut String) -> SlashAction {
    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    match cmd {
        "/exit" | "/quit" => return SlashAction::Exit,

        "/session" => match arg {
            Some(name) => match validate_session_key(name) {
                Ok(()) => {
                    *session_key = name.to_owned();
                    eprintln!("Session switched to: {session_key}");
                }
                Err(e) => eprintln!("{e}"),
            },
            None => {
                eprintln!("Current session: {session_key}");
                eprintln!("Usage: /session <name>");
            }
        },

        "/new" => {
            *session_key = new_session_key();
            eprintln!("New session: {session_key}");
        }

        "/history" => return SlashAction::ShowHistory,

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /session <name>  Switch to a named session");
            eprintln!("  /new             Start a fresh session");
            eprintln!("  /history         Show the current session's messages");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => eprintln!("Unknown command: {other}  (type /help for a list)"),
    }

    SlashAction::Continue
}

async fn show_history(runner: &TurnRunner, session_key: &str) {
    let messages = match runner.store().history(session_key).await {
        Ok(m) => m,
        Err(e) => {
            eprintln!("\x1B[31merror: {e}\x1B[0m");
            return;
        }
    };
    if messages.is_empty() {
        eprintln!("(no messages in {session_key})");
        return;
    }
    for msg in messages {
        match msg.role {
            Role::Ai if msg.has_tool_calls() => print_sql(std::slice::from_ref(&msg)),
            Role::Tool => eprintln!("\x1B[2mtool> {}\x1B[0m", msg.content),
            role => eprintln!("{}> {}", role.as_str(), msg.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        let mut key = "s".to_string();
        assert_eq!(handle_slash_command("/exit", &mut key), SlashAction::Exit);
        assert_eq!(handle_slash_command("/quit", &mut key), SlashAction::Exit);
    }

    #[test]
    fn session_switch_validates() {
        let mut key = "start".to_string();
        handle_slash_command("/session other-1", &mut key);
        assert_eq!(key, "other-1");

        handle_slash_command("/session ../bad", &mut key);
        assert_eq!(key, "other-1");
    }

    #[test]
    fn new_session_changes_key() {
        let mut key = "start".to_string();
        handle_slash_command("/new", &mut key);
        assert_ne!(key, "start");
        assert!(validate_session_key(&key).is_ok());
    }

    #[test]
    fn history_is_deferred_to_caller() {
        let mut key = "s".to_string();
        assert_eq!(handle_slash_command("/history", &mut key), SlashAction::ShowHistory);
        assert_eq!(handle_slash_command("/bogus", &mut key), SlashAction::Continue);
    }
}
