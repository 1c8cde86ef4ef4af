//! Prompt text for both model passes.

use sq_database::SchemaSnapshot;

/// Instructions shared by the decision and generation passes.
pub const SYSTEM_PREAMBLE: &str = "\
You are an assistant that answers questions using the contents of a relational database.

Rules:
1. Work out what the user is asking. If answering does not need the database, reply directly without querying it.
2. Keep answers short and answer only what was asked.
3. Reply in the language the question was asked in.

The database schema follows. Each line starts with a table name, followed by that table's columns:

";

/// System prompt for the decision pass: preamble plus one line per table.
pub fn decision_system_prompt(schema: &SchemaSnapshot) -> String {
    let mut prompt = String::from(SYSTEM_PREAMBLE);
    prompt.push_str(&schema.render());
    prompt
}

/// Human message for the generation pass.
pub fn generation_prompt(question: &str, data: &str) -> String {
    format!("{question}\n\nHere are the database results:\n{data}")
}
