//! Read-only gate for model-authored SQL.
//!
//! A statement passes only when the parser understands it and it is a
//! plain query. Anything else (DML, DDL, `SELECT ... INTO`, locking reads,
//! unparseable input) fails closed.

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// True when every statement in `sql` is a SELECT.
pub fn is_read_only(sql: &str) -> bool {
    check_read_only(sql).is_ok()
}

/// Like [`is_read_only`], but says why a statement was refused.
pub fn check_read_only(sql: &str) -> Result<(), String> {
    if sql.trim().is_empty() {
        return Err("empty statement".into());
    }

    let statements = Parser::parse_sql(&MySqlDialect {}, sql)
        .map_err(|e| format!("could not parse SQL: {e}"))?;
    if statements.is_empty() {
        return Err("empty statement".into());
    }

    for (i, stmt) in statements.iter().enumerate() {
        let ok = match stmt {
            Statement::Query(q) => query_is_read_only(q),
            _ => false,
        };
        if !ok {
            return Err(format!(
                "statement {} is not a read-only SELECT ({})",
                i + 1,
                leading_keyword(stmt)
            ));
        }
    }
    Ok(())
}

fn query_is_read_only(q: &Query) -> bool {
    if !q.locks.is_empty() {
        return false;
    }
    if let Some(with) = &q.with {
        if !with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)) {
            return false;
        }
    }
    set_expr_is_read_only(&q.body)
}

fn set_expr_is_read_only(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Query(q) => query_is_read_only(q),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        _ => false,
    }
}

fn leading_keyword(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_uppercase()
}
