use async_trait::async_trait;
use sqlparser::ast;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::{debug, trace};

use crate::context::ServerContext;
use crate::errors::{ExecError, Result};
use crate::job::{Job, TaskJob};
use crate::query::QueryContext;
use crate::session::SessionVars;
use crate::statement::{Statement, StatementKind};
use crate::value::Value;

/// Builds executable jobs from queries.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Build a job for the query.
    ///
    /// Returning `Ok(None)` indicates the query was fully handled during
    /// planning, and there's nothing left to do.
    async fn build(&self, svr: &ServerContext, ctx: QueryContext) -> Result<Option<Box<dyn Job>>>;
}

/// Plans queries by parsing with the MySQL dialect and asking the schema's
/// source for the tasks to run.
#[derive(Debug, Default)]
pub struct SqlPlanner;

impl SqlPlanner {
    pub fn new() -> SqlPlanner {
        SqlPlanner
    }
}

/// Parse a single statement.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let mut stmts = Parser::parse_sql(&MySqlDialect {}, sql)?;
    match stmts.len() {
        0 => Err(ExecError::EmptyQuery),
        1 => Ok(Statement::from_ast(stmts.remove(0))),
        n => Err(ExecError::MultipleStatements(n)),
    }
}

#[async_trait]
impl Planner for SqlPlanner {
    async fn build(&self, _svr: &ServerContext, ctx: QueryContext) -> Result<Option<Box<dyn Job>>> {
        let stmt = parse_statement(&ctx.sql)?;
        trace!(kind = %stmt.kind(), sql = %ctx.sql, "planning statement");

        // Commands have nothing to execute against a source. We apply what
        // we can to the session here and let the front end acknowledge.
        if *stmt.kind() == StatementKind::Command {
            if let Some(ast) = stmt.ast() {
                apply_set_variable(&mut ctx.session.write(), ast);
            }
            return Ok(Some(Box::new(TaskJob::new(
                ctx.with_statement(stmt),
                Vec::new(),
            ))));
        }

        if let StatementKind::Other(_) | StatementKind::Use(_) = stmt.kind() {
            // Schema switches belong to the session, and unknown statements
            // are rejected by the front end.
            return Ok(Some(Box::new(TaskJob::new(
                ctx.with_statement(stmt),
                Vec::new(),
            ))));
        }

        let source = ctx.schema.source().clone();
        let tasks = source.plan(&ctx, &stmt).await?;
        debug!(
            source = %source.source_type(),
            tasks = %tasks.len(),
            bind_vars = %ctx.bind_vars.len(),
            "planned statement"
        );

        Ok(Some(Box::new(TaskJob::new(ctx.with_statement(stmt), tasks))))
    }
}

/// Apply a `SET name = value` statement to the session.
///
/// Other statements are ignored.
fn apply_set_variable(session: &mut SessionVars, stmt: &ast::Statement) {
    if let ast::Statement::SetVariable {
        variables, value, ..
    } = stmt
    {
        let name = normalize_variable_name(&variables.to_string());
        let value = match value.first() {
            Some(expr) => expr_to_value(expr),
            None => Value::Null,
        };
        debug!(%name, %value, "setting session variable");
        session.set(&name, value);
    }
}

/// Strip scope qualifiers from a variable name.
///
/// `@@session.autocommit`, `SESSION autocommit` and `autocommit` all refer to
/// the same variable.
fn normalize_variable_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('@');
    let lower = name.to_lowercase();
    for prefix in ["session.", "local.", "global."] {
        if let Some(stripped) = lower.strip_prefix(prefix) {
            return stripped.to_string();
        }
    }
    lower
}

fn expr_to_value(expr: &ast::Expr) -> Value {
    let s = expr.to_string();
    if let Ok(v) = s.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = s.parse::<f64>() {
        return Value::Float(v);
    }
    match s.to_uppercase().as_str() {
        "NULL" => return Value::Null,
        "TRUE" | "ON" => return Value::Int(1),
        "FALSE" | "OFF" => return Value::Int(0),
        _ => (),
    }
    Value::Text(s.trim_matches(|c| c == '\'' || c == '"').to_string())
}
