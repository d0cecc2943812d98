//! MySQL protocol constants and the message types exchanged with the
//! transport.
use std::fmt;

use bytes::Bytes;
use fedexec::value::Value;

pub const COM_SLEEP: u8 = 0x00;
pub const COM_QUIT: u8 = 0x01;
pub const COM_INIT_DB: u8 = 0x02;
pub const COM_QUERY: u8 = 0x03;
pub const COM_FIELD_LIST: u8 = 0x04;
pub const COM_CREATE_DB: u8 = 0x05;
pub const COM_DROP_DB: u8 = 0x06;
pub const COM_REFRESH: u8 = 0x07;
pub const COM_SHUTDOWN: u8 = 0x08;
pub const COM_STATISTICS: u8 = 0x09;
pub const COM_PROCESS_INFO: u8 = 0x0a;
pub const COM_CONNECT: u8 = 0x0b;
pub const COM_PROCESS_KILL: u8 = 0x0c;
pub const COM_DEBUG: u8 = 0x0d;
pub const COM_PING: u8 = 0x0e;
pub const COM_TIME: u8 = 0x0f;
pub const COM_DELAYED_INSERT: u8 = 0x10;
pub const COM_CHANGE_USER: u8 = 0x11;
pub const COM_BINLOG_DUMP: u8 = 0x12;
pub const COM_TABLE_DUMP: u8 = 0x13;
pub const COM_CONNECT_OUT: u8 = 0x14;
pub const COM_REGISTER_SLAVE: u8 = 0x15;
pub const COM_STMT_PREPARE: u8 = 0x16;
pub const COM_STMT_EXECUTE: u8 = 0x17;
pub const COM_STMT_SEND_LONG_DATA: u8 = 0x18;
pub const COM_STMT_CLOSE: u8 = 0x19;
pub const COM_STMT_RESET: u8 = 0x1a;
pub const COM_SET_OPTION: u8 = 0x1b;
pub const COM_STMT_FETCH: u8 = 0x1c;
pub const COM_DAEMON: u8 = 0x1d;
pub const COM_BINLOG_DUMP_GTID: u8 = 0x1e;
pub const COM_RESET_CONNECTION: u8 = 0x1f;

/// Human readable name for a command byte.
pub fn command_name(cmd: u8) -> &'static str {
    match cmd {
        COM_SLEEP => "COM_SLEEP",
        COM_QUIT => "COM_QUIT",
        COM_INIT_DB => "COM_INIT_DB",
        COM_QUERY => "COM_QUERY",
        COM_FIELD_LIST => "COM_FIELD_LIST",
        COM_CREATE_DB => "COM_CREATE_DB",
        COM_DROP_DB => "COM_DROP_DB",
        COM_REFRESH => "COM_REFRESH",
        COM_SHUTDOWN => "COM_SHUTDOWN",
        COM_STATISTICS => "COM_STATISTICS",
        COM_PROCESS_INFO => "COM_PROCESS_INFO",
        COM_CONNECT => "COM_CONNECT",
        COM_PROCESS_KILL => "COM_PROCESS_KILL",
        COM_DEBUG => "COM_DEBUG",
        COM_PING => "COM_PING",
        COM_TIME => "COM_TIME",
        COM_DELAYED_INSERT => "COM_DELAYED_INSERT",
        COM_CHANGE_USER => "COM_CHANGE_USER",
        COM_BINLOG_DUMP => "COM_BINLOG_DUMP",
        COM_TABLE_DUMP => "COM_TABLE_DUMP",
        COM_CONNECT_OUT => "COM_CONNECT_OUT",
        COM_REGISTER_SLAVE => "COM_REGISTER_SLAVE",
        COM_STMT_PREPARE => "COM_STMT_PREPARE",
        COM_STMT_EXECUTE => "COM_STMT_EXECUTE",
        COM_STMT_SEND_LONG_DATA => "COM_STMT_SEND_LONG_DATA",
        COM_STMT_CLOSE => "COM_STMT_CLOSE",
        COM_STMT_RESET => "COM_STMT_RESET",
        COM_SET_OPTION => "COM_SET_OPTION",
        COM_STMT_FETCH => "COM_STMT_FETCH",
        COM_DAEMON => "COM_DAEMON",
        COM_BINLOG_DUMP_GTID => "COM_BINLOG_DUMP_GTID",
        COM_RESET_CONNECTION => "COM_RESET_CONNECTION",
        _ => "COM_UNKNOWN",
    }
}

/// Commands the handler knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FieldList,
    Query,
    Prepare,
    Ping,
    Quit,
    InitDb,
    /// Any other command, carrying the raw command byte.
    Unsupported(u8),
}

impl From<u8> for Command {
    fn from(cmd: u8) -> Self {
        match cmd {
            COM_FIELD_LIST => Command::FieldList,
            COM_QUERY => Command::Query,
            COM_STMT_PREPARE => Command::Prepare,
            COM_PING => Command::Ping,
            COM_QUIT => Command::Quit,
            COM_INIT_DB => Command::InitDb,
            other => Command::Unsupported(other),
        }
    }
}

pub const ER_UNKNOWN_ERROR: u16 = 1105;
pub const ER_WARN_DEPRECATED_SYNTAX: u16 = 1287;

/// Sql state sent along with errors that don't have a more specific one.
pub const DEFAULT_SQL_STATE: &str = "HY000";

pub const SERVER_STATUS_AUTOCOMMIT: u16 = 0x0002;

pub const NOT_NULL_FLAG: u16 = 1;
pub const UNSIGNED_FLAG: u16 = 32;
pub const BINARY_FLAG: u16 = 128;

/// An inbound message. The first byte is the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub raw: Bytes,
}

impl Request {
    pub fn new(raw: impl Into<Bytes>) -> Request {
        Request { raw: raw.into() }
    }

    /// Build a request for a command with a payload.
    pub fn command(cmd: u8, payload: impl AsRef<[u8]>) -> Request {
        let payload = payload.as_ref();
        let mut raw = Vec::with_capacity(payload.len() + 1);
        raw.push(cmd);
        raw.extend_from_slice(payload);
        Request { raw: raw.into() }
    }
}

/// An error reply sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlError {
    pub code: u16,
    pub state: &'static str,
    pub message: String,
}

impl MySqlError {
    pub fn new(code: u16, message: impl Into<String>) -> MySqlError {
        MySqlError {
            code,
            state: DEFAULT_SQL_STATE,
            message: message.into(),
        }
    }
}

impl fmt::Display for MySqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR {} ({}): {}", self.code, self.state, self.message)
    }
}

/// Contents of an OK reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OkResult {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status: u16,
    pub warnings: u16,
}

impl OkResult {
    pub fn new(affected_rows: u64, last_insert_id: u64) -> OkResult {
        OkResult {
            affected_rows,
            last_insert_id,
            status: SERVER_STATUS_AUTOCOMMIT,
            warnings: 0,
        }
    }
}

/// Column types as they appear in column definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColumnType {
    Tiny = 0x01,
    Double = 0x05,
    Null = 0x06,
    LongLong = 0x08,
    VarString = 0xfd,
    Blob = 0xfc,
}

/// A column definition in a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Database the column belongs to.
    pub schema: String,
    pub column_type: ColumnType,
    pub flags: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub fields: Vec<Field>,
    pub rows: Vec<Vec<Value>>,
}
