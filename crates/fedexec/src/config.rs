use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Default max allowed packet size for connections.
pub const DEFAULT_MAX_ALLOWED_PACKET: u64 = 4194304;

/// Server wide configuration, read by every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Disables the fault boundary around query handling.
    ///
    /// When set, a panic while handling a query is not converted into a query
    /// error and will propagate out of the connection handler.
    pub suppress_recover: bool,
    pub max_allowed_packet: u64,
    /// Version string reported to clients through `@@version`.
    pub server_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            suppress_recover: false,
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
            server_version: "5.7.0-fedsql".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load a config from a json document. Missing keys take their defaults.
    pub fn from_json(s: &str) -> Result<ServerConfig> {
        Ok(serde_json::from_str(s)?)
    }
}
