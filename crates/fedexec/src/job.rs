use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::errors::{internal, ExecError, Result};
use crate::query::QueryContext;
use crate::schema::Column;
use crate::task::Task;
use crate::value::Value;

/// Output produced by a job, consumed by a result writer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    /// Tabular output.
    Rows {
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    },
    /// Summary of a statement that modified data.
    Exec {
        affected_rows: u64,
        last_insert_id: u64,
    },
}

impl JobOutput {
    /// Short name for the variant, used in error messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            JobOutput::Rows { .. } => "rows",
            JobOutput::Exec { .. } => "exec",
        }
    }
}

/// Consumes the output of a job and encodes it for the client.
///
/// Constructing a writer must not perform any io, writing only happens
/// while the job runs.
#[async_trait]
pub trait ResultWriter: Send {
    fn name(&self) -> &'static str;

    async fn write(&mut self, output: JobOutput) -> Result<()>;
}

/// An executable query.
///
/// Jobs go through three phases: `finalize` attaches the result writer (and
/// waits for any remote tasks to be ready), `run` executes to completion, and
/// `close` tears everything down. `close` must be safe to call regardless of
/// how far the job got.
#[async_trait]
pub trait Job: Send {
    fn context(&self) -> &QueryContext;

    async fn finalize(&mut self, writer: Box<dyn ResultWriter>) -> Result<()>;

    async fn run(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Planned,
    Finalized,
    Ran,
    Closed,
}

/// A job made up of an ordered list of tasks.
///
/// The output of the last task is handed to the result writer.
pub struct TaskJob {
    ctx: QueryContext,
    tasks: Vec<Box<dyn Task>>,
    writer: Option<Box<dyn ResultWriter>>,
    state: JobState,
}

impl TaskJob {
    pub fn new(ctx: QueryContext, tasks: Vec<Box<dyn Task>>) -> TaskJob {
        TaskJob {
            ctx,
            tasks,
            writer: None,
            state: JobState::Planned,
        }
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == JobState::Closed
    }
}

#[async_trait]
impl Job for TaskJob {
    fn context(&self) -> &QueryContext {
        &self.ctx
    }

    async fn finalize(&mut self, writer: Box<dyn ResultWriter>) -> Result<()> {
        match self.state {
            JobState::Planned => (),
            JobState::Closed => return Err(ExecError::JobClosed),
            JobState::Finalized | JobState::Ran => return Err(ExecError::WriterAlreadyAttached),
        }

        for task in self.tasks.iter_mut() {
            trace!(task = %task.name(), "setting up task");
            task.setup().await?;
        }

        debug!(writer = %writer.name(), tasks = %self.tasks.len(), "finalized job");
        self.writer = Some(writer);
        self.state = JobState::Finalized;

        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        match self.state {
            JobState::Finalized => (),
            JobState::Planned => return Err(ExecError::NotFinalized),
            JobState::Ran => return Err(ExecError::AlreadyRan),
            JobState::Closed => return Err(ExecError::JobClosed),
        }
        self.state = JobState::Ran;

        let mut output = None;
        for task in self.tasks.iter_mut() {
            trace!(task = %task.name(), "executing task");
            output = task.execute(output).await?;
        }

        let output = output.ok_or_else(|| internal!("job produced no output: {}", self.ctx.sql))?;
        let writer = self.writer.as_mut().ok_or(ExecError::NotFinalized)?;
        writer.write(output).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == JobState::Closed {
            return Ok(());
        }
        self.state = JobState::Closed;
        self.writer = None;

        // Close everything, returning the first error.
        let mut result = Ok(());
        for task in self.tasks.iter_mut() {
            if let Err(e) = task.close().await {
                warn!(%e, task = %task.name(), "failed to close task");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::schema::tests::test_schema;
    use crate::schema::DataType;
    use crate::session::SessionVars;
    use crate::task::{OutputTask, RemoteTask};

    #[derive(Default, Clone)]
    struct CollectWriter {
        outputs: Arc<Mutex<Vec<JobOutput>>>,
    }

    #[async_trait]
    impl ResultWriter for CollectWriter {
        fn name(&self) -> &'static str {
            "collect"
        }

        async fn write(&mut self, output: JobOutput) -> Result<()> {
            self.outputs.lock().push(output);
            Ok(())
        }
    }

    struct CountingClose {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl Task for CountingClose {
        fn name(&self) -> &str {
            "counting"
        }

        async fn execute(&mut self, input: Option<JobOutput>) -> Result<Option<JobOutput>> {
            Ok(input)
        }

        async fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(internal!("close failed"));
            }
            Ok(())
        }
    }

    fn test_ctx() -> QueryContext {
        QueryContext::new(
            "select * from users",
            Arc::new(test_schema("github")),
            SessionVars::new().into_ref(),
        )
    }

    fn rows_output() -> JobOutput {
        JobOutput::Rows {
            columns: vec![Column::new("id", DataType::Int64, false)],
            rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        }
    }

    #[tokio::test]
    async fn lifecycle() {
        let closes = Arc::new(AtomicUsize::new(0));
        let writer = CollectWriter::default();
        let mut job = TaskJob::new(
            test_ctx(),
            vec![
                Box::new(OutputTask::new(rows_output())),
                Box::new(CountingClose {
                    closes: closes.clone(),
                    fail_close: false,
                }),
            ],
        );

        job.finalize(Box::new(writer.clone())).await.unwrap();
        job.run().await.unwrap();
        job.close().await.unwrap();
        job.close().await.unwrap();

        assert!(job.is_closed());
        assert_eq!(1, closes.load(Ordering::SeqCst));
        assert_eq!(vec![rows_output()], *writer.outputs.lock());
    }

    #[tokio::test]
    async fn run_requires_finalize() {
        let mut job = TaskJob::new(test_ctx(), vec![Box::new(OutputTask::new(rows_output()))]);
        assert!(matches!(job.run().await, Err(ExecError::NotFinalized)));
    }

    #[tokio::test]
    async fn single_writer() {
        let mut job = TaskJob::new(test_ctx(), vec![Box::new(OutputTask::new(rows_output()))]);
        job.finalize(Box::new(CollectWriter::default()))
            .await
            .unwrap();
        let err = job
            .finalize(Box::new(CollectWriter::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::WriterAlreadyAttached));
    }

    #[tokio::test]
    async fn run_once() {
        let mut job = TaskJob::new(test_ctx(), vec![Box::new(OutputTask::new(rows_output()))]);
        job.finalize(Box::new(CollectWriter::default()))
            .await
            .unwrap();
        job.run().await.unwrap();
        assert!(matches!(job.run().await, Err(ExecError::AlreadyRan)));
    }

    #[tokio::test]
    async fn no_output() {
        let mut job = TaskJob::new(test_ctx(), Vec::new());
        job.finalize(Box::new(CollectWriter::default()))
            .await
            .unwrap();
        assert!(matches!(job.run().await, Err(ExecError::Internal(_))));
    }

    #[tokio::test]
    async fn finalize_waits_for_remote() {
        let writer = CollectWriter::default();
        let (remote, ready) = RemoteTask::new("worker-1", OutputTask::new(rows_output()));
        let mut job = TaskJob::new(test_ctx(), vec![Box::new(remote)]);

        let signal = tokio::spawn(async move { ready.signal() });
        job.finalize(Box::new(writer.clone())).await.unwrap();
        signal.await.unwrap();

        job.run().await.unwrap();
        assert_eq!(1, writer.outputs.lock().len());
    }

    #[tokio::test]
    async fn finalize_remote_unavailable_then_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (remote, ready) = RemoteTask::new(
            "worker-1",
            CountingClose {
                closes: closes.clone(),
                fail_close: false,
            },
        );
        drop(ready);

        let mut job = TaskJob::new(test_ctx(), vec![Box::new(remote)]);
        let err = job
            .finalize(Box::new(CollectWriter::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::WorkerUnavailable(_)));

        // Closing a job that never ran still tears down tasks.
        job.close().await.unwrap();
        assert_eq!(1, closes.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn close_closes_all_tasks_on_error() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut job = TaskJob::new(
            test_ctx(),
            vec![
                Box::new(CountingClose {
                    closes: closes.clone(),
                    fail_close: true,
                }),
                Box::new(CountingClose {
                    closes: closes.clone(),
                    fail_close: false,
                }),
            ],
        );

        job.close().await.unwrap_err();
        assert_eq!(2, closes.load(Ordering::SeqCst));
    }
}
