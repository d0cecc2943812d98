use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use fedexec::context::ServerContext;
use fedexec::errors::Result as ExecResult;
use fedexec::job::{Job, ResultWriter};
use fedexec::planner::Planner;
use fedexec::query::QueryContext;
use fedexec::schema::Schema;
use fedexec::session::SessionRef;
use fedexec::value::Value;
use futures::FutureExt;
use tracing::{debug, error, trace, warn};

use crate::bind_vars::make_bind_vars;
use crate::conn::{MySqlConn, ResultSink};
use crate::errors::{MySqlSrvError, Result};
use crate::protocol::{command_name, Command, OkResult, Request};
use crate::recover::{catch_faults, recovered};
use crate::session::new_mysql_session_vars;
use crate::writers::{select_writer, WriterSelection};

/// Creates per-connection handlers.
pub trait ConnectionHandle: Send + Sync {
    type Handler: Handler;

    /// Bind a new handler to an accepted connection.
    fn open(&self, conn: Box<dyn Any + Send>) -> Result<Self::Handler>;
}

/// A handler for a single connection.
#[async_trait]
pub trait Handler: Send {
    async fn handle(&mut self, sink: Arc<dyn ResultSink>, req: Request) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// State shared between all connections.
///
/// This is the template each connection's handler is opened from. Cloning is
/// cheap, only references are copied.
pub struct MySqlHandlerShared<C> {
    svr: Arc<ServerContext>,
    planner: Arc<dyn Planner>,
    _conn: PhantomData<fn() -> C>,
}

impl<C> Clone for MySqlHandlerShared<C> {
    fn clone(&self) -> Self {
        MySqlHandlerShared {
            svr: self.svr.clone(),
            planner: self.planner.clone(),
            _conn: PhantomData,
        }
    }
}

impl<C: MySqlConn> MySqlHandlerShared<C> {
    pub fn new(svr: Arc<ServerContext>, planner: Arc<dyn Planner>) -> Self {
        MySqlHandlerShared {
            svr,
            planner,
            _conn: PhantomData,
        }
    }

    pub fn server_context(&self) -> &Arc<ServerContext> {
        &self.svr
    }

    /// Open a handler for a connection, with fresh session state.
    pub fn open_conn(&self, conn: C) -> MySqlHandler<C> {
        let session = new_mysql_session_vars(self.svr.config()).into_ref();
        MySqlHandler {
            shared: self.clone(),
            session,
            conn: Some(conn),
            schema: None,
        }
    }
}

impl<C: MySqlConn> ConnectionHandle for MySqlHandlerShared<C> {
    type Handler = MySqlHandler<C>;

    fn open(&self, conn: Box<dyn Any + Send>) -> Result<MySqlHandler<C>> {
        match conn.downcast::<C>() {
            Ok(conn) => Ok(self.open_conn(*conn)),
            Err(_) => Err(MySqlSrvError::InvalidTransport {
                expected: type_name::<C>(),
            }),
        }
    }
}

/// A single connection's session.
///
/// Not shared between connections.
pub struct MySqlHandler<C> {
    shared: MySqlHandlerShared<C>,
    session: SessionRef,
    /// Connection to the client. `None` once closed.
    conn: Option<C>,
    schema: Option<Arc<Schema>>,
}

impl<C: MySqlConn> MySqlHandler<C> {
    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    /// The schema currently in use.
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Close the connection. Closing an already closed connection is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            trace!("closing connection");
            conn.close().await?;
        }
        Ok(())
    }

    pub async fn handle(&mut self, sink: Arc<dyn ResultSink>, req: Request) -> Result<()> {
        self.choose_command(sink, req).await
    }

    /// Run a parameterized statement.
    ///
    /// For transports that decode `COM_STMT_EXECUTE` themselves. Arguments
    /// are exposed to the planner as `v1..vN`.
    pub async fn execute_prepared(
        &mut self,
        sink: Arc<dyn ResultSink>,
        sql: &str,
        args: &[Value],
    ) -> Result<()> {
        self.handle_query(sink, sql.to_string(), args).await
    }

    /// Set the session's schema.
    ///
    /// If no schema exists with the given name, the current schema is left
    /// untouched.
    pub fn schema_use(&mut self, name: &str) -> Option<Arc<Schema>> {
        match self.shared.svr.schema(name) {
            Some(schema) => {
                debug!(%name, "using schema");
                self.schema = Some(schema.clone());
                Some(schema)
            }
            None => {
                warn!(%name, "could not find schema");
                None
            }
        }
    }

    /// Serve requests until the client disconnects or quits.
    ///
    /// Query errors are sent back to the client. Only transport errors end
    /// the connection early.
    pub async fn run(mut self, sink: Arc<dyn ResultSink>) -> Result<()> {
        loop {
            let conn = match self.conn.as_mut() {
                Some(conn) => conn,
                None => return Ok(()), // Quit.
            };

            let req = match conn.read_request().await {
                Ok(Some(req)) => req,
                Ok(None) => {
                    trace!("connection closed by client");
                    return self.close().await;
                }
                Err(e) => {
                    self.close_after_failure().await;
                    return Err(e.into());
                }
            };

            match self.handle(sink.clone(), req).await {
                Ok(()) => (),
                Err(e) if e.is_fatal() => {
                    error!(%e, "connection failed");
                    self.close_after_failure().await;
                    return Err(e);
                }
                Err(e) => {
                    let err = e.to_mysql_error();
                    debug!(code = %err.code, message = %err.message, "sending error");
                    self.conn_mut()?.write_error(&err).await?;
                }
            }
        }
    }

    /// Close the connection while already handling a failure, logging any
    /// close error.
    async fn close_after_failure(&mut self) {
        if let Err(e) = self.close().await {
            warn!(%e, "failed to close connection");
        }
    }

    fn conn_mut(&mut self) -> Result<&mut C> {
        self.conn.as_mut().ok_or(MySqlSrvError::ConnectionClosed)
    }

    async fn write_ok(&mut self, result: Option<OkResult>) -> Result<()> {
        self.conn_mut()?.write_ok(result).await?;
        Ok(())
    }

    async fn choose_command(&mut self, sink: Arc<dyn ResultSink>, req: Request) -> Result<()> {
        let (cmd, payload) = match req.raw.split_first() {
            Some((cmd, payload)) => (*cmd, payload),
            None => return Err(MySqlSrvError::EmptyRequest),
        };
        trace!(%cmd, name = %command_name(cmd), "received command");

        match Command::from(cmd) {
            // Deprecated by MySQL, not supported.
            Command::FieldList => Err(MySqlSrvError::DeprecatedCommand(cmd)),
            Command::Query | Command::Prepare => {
                let sql = String::from_utf8_lossy(payload).into_owned();
                self.handle_query(sink, sql, &[]).await
            }
            Command::Ping => self.write_ok(None).await,
            Command::Quit => self.close().await,
            Command::InitDb => {
                let name = String::from_utf8_lossy(payload).into_owned();
                match self.schema_use(&name) {
                    Some(_) => self.write_ok(None).await,
                    None => Err(MySqlSrvError::SchemaNotFound(name)),
                }
            }
            Command::Unsupported(cmd) => Err(MySqlSrvError::UnsupportedCommand(cmd)),
        }
    }

    async fn handle_query(
        &mut self,
        sink: Arc<dyn ResultSink>,
        sql: String,
        args: &[Value],
    ) -> Result<()> {
        if self.shared.svr.config().suppress_recover {
            // Faults propagate out of the handler.
            self.query_pipeline(sink, &sql, args).await
        } else {
            catch_faults(&sql, self.query_pipeline(sink, &sql, args)).await
        }
    }

    async fn query_pipeline(
        &mut self,
        sink: Arc<dyn ResultSink>,
        sql: &str,
        args: &[Value],
    ) -> Result<()> {
        let schema = match &self.schema {
            Some(schema) => schema.clone(),
            None => {
                warn!("missing schema");
                return Err(MySqlSrvError::NoSchemaInUse);
            }
        };

        let svr = self.shared.svr.clone();
        let mut ctx = QueryContext::new(sql, schema, self.session.clone())
            .with_disable_recover(svr.config().suppress_recover);
        if !args.is_empty() {
            ctx = ctx.with_bind_vars(make_bind_vars(args));
        }

        let job = match self.shared.planner.build(&svr, ctx).await {
            Ok(Some(job)) => job,
            Ok(None) => return Ok(()), // Results already written during planning.
            Err(e) => {
                // SET statements we can't plan (transaction isolation and the
                // like) are acknowledged without being executed.
                if sql.to_lowercase().starts_with("set ") {
                    debug!(%e, %sql, "ignoring unplanned set statement");
                    return self.write_ok(None).await;
                }
                debug!(%e, %sql, "failed to plan statement");
                return Err(e.into());
            }
        };

        self.execute_job(sink, job).await
    }

    /// Finalize, run, and close a job.
    ///
    /// The job is always closed, including when finalizing or running
    /// faults. A close error is only returned if everything before it
    /// succeeded.
    async fn execute_job(
        &mut self,
        sink: Arc<dyn ResultSink>,
        mut job: Box<dyn Job>,
    ) -> Result<()> {
        let writer = match select_writer(sink, job.context()) {
            Ok(WriterSelection::Writer(writer)) => writer,
            Ok(WriterSelection::Acknowledge) => {
                close_job(job.as_mut()).await?;
                return self.write_ok(None).await;
            }
            Ok(WriterSelection::UseSchema(name)) => {
                close_job(job.as_mut()).await?;
                return match self.schema_use(&name) {
                    Some(_) => self.write_ok(None).await,
                    None => Err(MySqlSrvError::SchemaNotFound(name)),
                };
            }
            Err(e) => {
                warn!(%e, sql = %job.context().sql, "statement not supported");
                // Close errors are logged, the unsupported statement is what
                // the client sees.
                let _ = close_job(job.as_mut()).await;
                return Err(e);
            }
        };

        let outcome = AssertUnwindSafe(finalize_and_run(job.as_mut(), writer))
            .catch_unwind()
            .await;
        let closed = close_job(job.as_mut()).await;

        match outcome {
            Ok(Ok(())) => closed.map_err(MySqlSrvError::from),
            Ok(Err(e)) => Err(e),
            // Job is closed, let the fault continue on to the caller.
            Err(payload) if self.shared.svr.config().suppress_recover => resume_unwind(payload),
            Err(payload) => Err(recovered(&job.context().sql, payload)),
        }
    }
}

#[async_trait]
impl<C: MySqlConn> Handler for MySqlHandler<C> {
    async fn handle(&mut self, sink: Arc<dyn ResultSink>, req: Request) -> Result<()> {
        MySqlHandler::handle(self, sink, req).await
    }

    async fn close(&mut self) -> Result<()> {
        MySqlHandler::close(self).await
    }
}

async fn finalize_and_run(job: &mut dyn Job, writer: Box<dyn ResultWriter>) -> Result<()> {
    // Finalize inserts any tasks that need to run on other worker nodes,
    // waits for them to be ready, then attaches the writer.
    if let Err(e) = job.finalize(writer).await {
        error!(%e, "failed to finalize job");
        return Err(MySqlSrvError::Finalize(e));
    }

    if let Err(e) = job.run().await {
        error!(%e, "failed to run job");
        return Err(e.into());
    }

    Ok(())
}

/// Close a job, logging any error.
async fn close_job(job: &mut dyn Job) -> ExecResult<()> {
    let result = job.close().await;
    if let Err(e) = &result {
        warn!(%e, "failed to close job");
    }
    result
}

#[allow(dead_code)]
fn assert_conformance<C: MySqlConn>() {
    fn is_handler<H: Handler>() {}
    fn is_connection_handle<H: ConnectionHandle>() {}

    is_handler::<MySqlHandler<C>>();
    is_connection_handle::<MySqlHandlerShared<C>>();
}
