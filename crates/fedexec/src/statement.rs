use std::fmt;

use sqlparser::ast;

/// The category a statement falls into, used to pick how its results are
/// encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Show,
    Describe,
    Insert,
    Upsert,
    Update,
    Delete,
    /// Session or administrative commands (SET, BEGIN, COMMIT, ...).
    Command,
    /// Switch the session to the named schema.
    Use(String),
    /// Anything we don't know how to handle, tagged with its leading keyword.
    Other(String),
}

impl StatementKind {
    pub fn as_str(&self) -> &str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Show => "SHOW",
            StatementKind::Describe => "DESCRIBE",
            StatementKind::Insert => "INSERT",
            StatementKind::Upsert => "UPSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Command => "COMMAND",
            StatementKind::Use(_) => "USE",
            StatementKind::Other(keyword) => keyword,
        }
    }

    /// If this statement modifies data in a source.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::Upsert
                | StatementKind::Update
                | StatementKind::Delete
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed statement.
///
/// The ast is optional since planners not backed by `sqlparser` only need to
/// provide the kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    ast: Option<ast::Statement>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Statement {
        Statement { kind, ast: None }
    }

    pub fn from_ast(ast: ast::Statement) -> Statement {
        let kind = classify(&ast);
        Statement {
            kind,
            ast: Some(ast),
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    pub fn ast(&self) -> Option<&ast::Statement> {
        self.ast.as_ref()
    }
}

fn classify(stmt: &ast::Statement) -> StatementKind {
    use ast::Statement as S;

    match stmt {
        S::Query(_) => StatementKind::Select,
        // REPLACE INTO and INSERT ... ON DUPLICATE KEY UPDATE
        S::Insert(insert) if insert.replace_into || insert.on.is_some() => StatementKind::Upsert,
        S::Insert(_) => StatementKind::Insert,
        S::Update { .. } => StatementKind::Update,
        S::Delete(_) => StatementKind::Delete,
        S::ShowTables { .. }
        | S::ShowViews { .. }
        | S::ShowColumns { .. }
        | S::ShowCreate { .. }
        | S::ShowDatabases { .. }
        | S::ShowSchemas { .. }
        | S::ShowVariables { .. }
        | S::ShowVariable { .. }
        | S::ShowStatus { .. }
        | S::ShowCollation { .. }
        | S::ShowFunctions { .. } => StatementKind::Show,
        S::ExplainTable { .. } => StatementKind::Describe,
        S::Explain {
            describe_alias: ast::DescribeAlias::Describe | ast::DescribeAlias::Desc,
            ..
        } => StatementKind::Describe,
        S::Use(ast::Use::Object(name) | ast::Use::Database(name) | ast::Use::Schema(name)) => {
            match name.0.last() {
                Some(ident) => StatementKind::Use(ident.value.clone()),
                None => leading_keyword(stmt),
            }
        }
        S::SetVariable { .. }
        | S::SetNames { .. }
        | S::SetNamesDefault {}
        | S::SetTimeZone { .. }
        | S::SetTransaction { .. }
        | S::SetRole { .. }
        | S::StartTransaction { .. }
        | S::Commit { .. }
        | S::Rollback { .. }
        | S::Savepoint { .. } => StatementKind::Command,
        other => leading_keyword(other),
    }
}

/// Tag an unhandled statement with its leading keyword for error messages.
fn leading_keyword(stmt: &ast::Statement) -> StatementKind {
    let sql = stmt.to_string();
    let keyword = sql.split_whitespace().next().unwrap_or_default();
    StatementKind::Other(keyword.to_uppercase())
}
