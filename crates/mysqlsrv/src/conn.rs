use std::io;

use async_trait::async_trait;

use crate::protocol::{MySqlError, OkResult, Request, ResultSet};

/// The client connection, as seen by the handler.
///
/// Implementations own the socket and the packet framing. The handler drives
/// the lifecycle and calls `close` exactly once.
#[async_trait]
pub trait MySqlConn: Send + 'static {
    /// Read the next request, returning `None` on end of stream.
    async fn read_request(&mut self) -> io::Result<Option<Request>>;

    async fn write_ok(&mut self, result: Option<OkResult>) -> io::Result<()>;

    async fn write_error(&mut self, err: &MySqlError) -> io::Result<()>;

    async fn close(&mut self) -> io::Result<()>;
}

/// Where result writers send statement output.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write_result_set(&self, result: ResultSet) -> io::Result<()>;

    async fn write_exec_result(&self, result: OkResult) -> io::Result<()>;
}
