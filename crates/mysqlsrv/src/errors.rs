use std::io;

use fedexec::errors::ExecError;

use crate::protocol::{command_name, MySqlError, ER_UNKNOWN_ERROR, ER_WARN_DEPRECATED_SYNTAX};

pub type Result<T, E = MySqlSrvError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum MySqlSrvError {
    #[error("command {}:{} is deprecated", .0, command_name(*.0))]
    DeprecatedCommand(u8),

    #[error("command {}:{} not yet supported", .0, command_name(*.0))]
    UnsupportedCommand(u8),

    #[error("empty request, missing command byte")]
    EmptyRequest,

    #[error("no schema in use")]
    NoSchemaInUse,

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("statement type {0} not supported")]
    UnsupportedStatement(String),

    #[error("failed to finalize query: {0}")]
    Finalize(ExecError),

    #[error("handle query {sql} error {fault}")]
    Recovered { sql: String, fault: String },

    #[error("invalid transport, expected {expected}")]
    InvalidTransport { expected: &'static str },

    #[error("connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MySqlSrvError {
    /// Error code to report to the client.
    pub fn code(&self) -> u16 {
        match self {
            MySqlSrvError::DeprecatedCommand(_) => ER_WARN_DEPRECATED_SYNTAX,
            _ => ER_UNKNOWN_ERROR,
        }
    }

    /// Convert to an error reply.
    pub fn to_mysql_error(&self) -> MySqlError {
        MySqlError::new(self.code(), self.to_string())
    }

    /// Whether this error means the connection can no longer be used.
    ///
    /// Only transport failures are fatal, everything else is reported to the
    /// client.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MySqlSrvError::Io(_)
                | MySqlSrvError::ConnectionClosed
                | MySqlSrvError::Exec(ExecError::Io(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{COM_FIELD_LIST, COM_STMT_EXECUTE};

    #[test]
    fn codes() {
        assert_eq!(
            ER_WARN_DEPRECATED_SYNTAX,
            MySqlSrvError::DeprecatedCommand(COM_FIELD_LIST).code()
        );
        assert_eq!(ER_UNKNOWN_ERROR, MySqlSrvError::NoSchemaInUse.code());
        assert_eq!(
            ER_UNKNOWN_ERROR,
            MySqlSrvError::Exec(ExecError::EmptyQuery).code()
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            "command 23:COM_STMT_EXECUTE not yet supported",
            MySqlSrvError::UnsupportedCommand(COM_STMT_EXECUTE).to_string()
        );
        assert_eq!(
            "command 4:COM_FIELD_LIST is deprecated",
            MySqlSrvError::DeprecatedCommand(COM_FIELD_LIST).to_string()
        );
    }

    #[test]
    fn fatal() {
        let io_err = || io::Error::new(io::ErrorKind::BrokenPipe, "broken");
        assert!(MySqlSrvError::Io(io_err()).is_fatal());
        assert!(MySqlSrvError::Exec(ExecError::Io(io_err())).is_fatal());
        assert!(!MySqlSrvError::SchemaNotFound("a".to_string()).is_fatal());
        assert!(!MySqlSrvError::Finalize(ExecError::NotFinalized).is_fatal());
    }
}
