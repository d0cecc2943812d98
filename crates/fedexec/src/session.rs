use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::Value;

/// Session variables shared between a connection and the queries it runs.
pub type SessionRef = Arc<RwLock<SessionVars>>;

/// Per-connection session variables.
///
/// Names are case insensitive, and are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionVars {
    vars: HashMap<String, Value>,
}

impl SessionVars {
    pub fn new() -> SessionVars {
        SessionVars::default()
    }

    pub fn into_ref(self) -> SessionRef {
        Arc::new(RwLock::new(self))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(&name.to_lowercase())
    }

    /// Set a variable, returning the previous value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.to_lowercase(), value.into())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate all variables sorted by name.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &Value)> {
        let mut vars: Vec<_> = self.vars.iter().map(|(k, v)| (k.as_str(), v)).collect();
        vars.sort_by(|a, b| a.0.cmp(b.0));
        vars.into_iter()
    }
}
