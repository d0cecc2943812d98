use std::sync::Arc;

use crate::config::ServerConfig;
use crate::schema::{Schema, SchemaRegistry};

/// Process wide state shared by all connections.
#[derive(Debug, Default)]
pub struct ServerContext {
    config: ServerConfig,
    registry: SchemaRegistry,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> ServerContext {
        ServerContext {
            config,
            registry: SchemaRegistry::new(),
        }
    }

    pub fn with_registry(config: ServerConfig, registry: SchemaRegistry) -> ServerContext {
        ServerContext { config, registry }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Look up a schema by name.
    pub fn schema(&self, name: &str) -> Option<Arc<Schema>> {
        self.registry.get(name)
    }
}
