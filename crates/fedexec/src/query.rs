use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::Schema;
use crate::session::SessionRef;
use crate::statement::Statement;
use crate::value::Value;

/// Everything needed to plan and execute a single query.
///
/// Only lives for the duration of one query.
#[derive(Debug)]
pub struct QueryContext {
    /// Raw sql text as sent by the client.
    pub sql: String,
    /// Parsed statement, filled in by the planner.
    pub stmt: Option<Statement>,
    /// Schema active on the session when the query was issued.
    pub schema: Arc<Schema>,
    pub session: SessionRef,
    /// Mirrors `ServerConfig::suppress_recover`.
    pub disable_recover: bool,
    /// Named parameters, see `mysqlsrv::bind_vars`.
    pub bind_vars: HashMap<String, Value>,
}

impl QueryContext {
    pub fn new(sql: impl Into<String>, schema: Arc<Schema>, session: SessionRef) -> QueryContext {
        QueryContext {
            sql: sql.into(),
            stmt: None,
            schema,
            session,
            disable_recover: false,
            bind_vars: HashMap::new(),
        }
    }

    pub fn with_disable_recover(mut self, disable_recover: bool) -> Self {
        self.disable_recover = disable_recover;
        self
    }

    pub fn with_bind_vars(mut self, bind_vars: HashMap<String, Value>) -> Self {
        self.bind_vars = bind_vars;
        self
    }

    pub fn with_statement(mut self, stmt: Statement) -> Self {
        self.stmt = Some(stmt);
        self
    }
}
