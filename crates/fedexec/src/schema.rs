use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::Result;
use crate::query::QueryContext;
use crate::statement::Statement;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int64,
    UInt64,
    Float64,
    Utf8,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Column {
        Column {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

/// A backend source that queries against a schema are dispatched to.
///
/// Sources translate a classified statement into the tasks that produce its
/// output. Tasks may run locally or on remote worker nodes.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Name of the source type, e.g. "elasticsearch".
    fn source_type(&self) -> &str;

    async fn plan(&self, ctx: &QueryContext, stmt: &Statement) -> Result<Vec<Box<dyn Task>>>;
}

/// A named data source definition that sessions can `USE`.
pub struct Schema {
    name: String,
    tables: Vec<Table>,
    source: Arc<dyn DataSource>,
}

impl Schema {
    pub fn new(name: impl Into<String>, tables: Vec<Table>, source: Arc<dyn DataSource>) -> Schema {
        Schema {
            name: name.into(),
            tables,
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Get a table by name, ignoring case.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("tables", &self.tables)
            .field("source", &self.source.source_type())
            .finish()
    }
}

/// Registry of all schemas known to the server.
///
/// Lookups never block on anything other than a concurrent registration.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    pub fn new() -> SchemaRegistry {
        SchemaRegistry::default()
    }

    /// Register a schema, returning the schema it replaced if any.
    pub fn register(&self, schema: Schema) -> Option<Arc<Schema>> {
        debug!(name = %schema.name, source = %schema.source.source_type(), "registering schema");
        let schema = Arc::new(schema);
        self.schemas.write().insert(schema.name.clone(), schema)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.read().get(name).cloned()
    }

    /// Names of all registered schemas, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct NoopSource;

    #[async_trait]
    impl DataSource for NoopSource {
        fn source_type(&self) -> &str {
            "noop"
        }

        async fn plan(&self, _ctx: &QueryContext, _stmt: &Statement) -> Result<Vec<Box<dyn Task>>> {
            Ok(Vec::new())
        }
    }

    pub(crate) fn test_schema(name: &str) -> Schema {
        Schema::new(
            name,
            vec![Table {
                name: "users".to_string(),
                columns: vec![
                    Column::new("id", DataType::Int64, false),
                    Column::new("name", DataType::Utf8, true),
                ],
            }],
            Arc::new(NoopSource),
        )
    }

    #[test]
    fn register_and_get() {
        let registry = SchemaRegistry::new();
        assert!(registry.register(test_schema("github")).is_none());
        assert!(registry.register(test_schema("logs")).is_none());

        let schema = registry.get("github").unwrap();
        assert_eq!("github", schema.name());
        assert!(registry.get("GITHUB").is_none());
        assert_eq!(vec!["github".to_string(), "logs".to_string()], registry.names());
    }

    #[test]
    fn replace_and_remove() {
        let registry = SchemaRegistry::new();
        registry.register(test_schema("github"));
        let old = registry.register(test_schema("github")).unwrap();
        assert_eq!("github", old.name());

        registry.remove("github").unwrap();
        assert!(registry.get("github").is_none());
    }

    #[test]
    fn table_lookup_ignores_case() {
        let schema = test_schema("github");
        assert_eq!(2, schema.table("USERS").unwrap().columns.len());
        assert!(schema.table("orgs").is_none());
    }
}
