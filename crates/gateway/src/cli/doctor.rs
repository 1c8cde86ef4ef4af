use std::sync::Arc;

use sq_database::{DbCredentials, MySqlExecutor, QueryExecutor, SchemaIntrospector};
use sq_domain::config::{Config, ConfigSeverity};
use sq_providers::util::resolve_api_key;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("sqlagent doctor");
    println!("===============\n");

    let mut all_passed = true;

    check_config_file(config_path);
    check_config_validation(config, &mut all_passed);
    check_api_key(config, &mut all_passed);

    // The connectivity and schema checks need credentials first.
    if let Some(creds) = check_db_credentials(config, &mut all_passed) {
        let executor: Arc<dyn QueryExecutor> = Arc::new(MySqlExecutor::new(&creds));
        if check_db_reachable(executor.as_ref(), &creds, &mut all_passed).await {
            check_schema(config, executor, &mut all_passed).await;
        }
    }

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config_file(config_path: &str) {
    let exists = std::path::Path::new(config_path).exists();
    // Defaults are usable, so a missing file is reported but not a failure.
    print_check(
        "Config file",
        true,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
        return;
    }

    print_check(
        "Config validation",
        error_count == 0,
        format!("{} issue(s) ({error_count} error(s))", issues.len()),
    );
    for issue in &issues {
        println!("      {issue}");
    }
    if error_count > 0 {
        *all_passed = false;
    }
}

fn check_api_key(config: &Config, all_passed: &mut bool) {
    match resolve_api_key(&config.llm.auth) {
        Ok(_) => print_check("LLM API key", true, format!("resolved for {}", config.llm.provider_id)),
        Err(e) => {
            print_check("LLM API key", false, e.to_string());
            *all_passed = false;
        }
    }
}

fn check_db_credentials(config: &Config, all_passed: &mut bool) -> Option<DbCredentials> {
    match DbCredentials::from_config(&config.database) {
        Ok(creds) => {
            print_check(
                "Database credentials",
                true,
                format!("{}@{}:{}/{}", creds.user, creds.host, creds.port, creds.database),
            );
            Some(creds)
        }
        Err(e) => {
            print_check("Database credentials", false, e.to_string());
            *all_passed = false;
            None
        }
    }
}

async fn check_db_reachable(
    executor: &dyn QueryExecutor,
    creds: &DbCredentials,
    all_passed: &mut bool,
) -> bool {
    match executor.execute("SELECT 1").await {
        Ok(_) => {
            print_check("Database reachable", true, format!("{}:{}", creds.host, creds.port));
            true
        }
        Err(e) => {
            print_check("Database reachable", false, e.to_string());
            *all_passed = false;
            false
        }
    }
}

async fn check_schema(config: &Config, executor: Arc<dyn QueryExecutor>, all_passed: &mut bool) {
    let introspector = SchemaIntrospector::new(executor, config.database.excluded_schemas.clone());
    match introspector.fetch_schema().await {
        Ok(schema) if schema.is_empty() => {
            print_check("Schema", false, "no user tables visible to this account".into());
            *all_passed = false;
        }
        Ok(schema) => print_check(
            "Schema",
            true,
            format!("{} table(s), {} column(s)", schema.tables.len(), schema.column_count()),
        ),
        Err(e) => {
            print_check("Schema", false, e.to_string());
            *all_passed = false;
        }
    }
}

// ── Formatting helper ─────────────────────────────────────────────────

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
