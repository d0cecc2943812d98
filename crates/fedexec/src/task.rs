use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::errors::{ExecError, Result};
use crate::job::JobOutput;

/// A unit of work within a job.
///
/// Tasks are executed in order, each receiving the output of the task
/// before it.
#[async_trait]
pub trait Task: Send {
    fn name(&self) -> &str;

    /// Prepare the task for execution. Called once during job finalization.
    async fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    async fn execute(&mut self, input: Option<JobOutput>) -> Result<Option<JobOutput>>;

    /// Tear down the task. Called at most once.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A task producing an output that's already been computed.
#[derive(Debug)]
pub struct OutputTask {
    output: Option<JobOutput>,
}

impl OutputTask {
    pub fn new(output: JobOutput) -> OutputTask {
        OutputTask {
            output: Some(output),
        }
    }
}

#[async_trait]
impl Task for OutputTask {
    fn name(&self) -> &str {
        "output"
    }

    async fn execute(&mut self, _input: Option<JobOutput>) -> Result<Option<JobOutput>> {
        Ok(self.output.take())
    }
}

/// Signals that a remote worker is ready to receive data for a task.
#[derive(Debug)]
pub struct WorkerReady {
    node: String,
    tx: oneshot::Sender<()>,
}

impl WorkerReady {
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn signal(self) {
        trace!(node = %self.node, "worker ready");
        // We don't care if the receiver dropped, the job was closed before
        // the worker became ready.
        let _ = self.tx.send(());
    }
}

/// A task running on a remote worker node.
///
/// Setup blocks until the worker signals readiness. If the signalling side
/// is dropped without signalling, setup fails.
pub struct RemoteTask<T> {
    node: String,
    ready: Option<oneshot::Receiver<()>>,
    inner: T,
}

impl<T: Task> RemoteTask<T> {
    pub fn new(node: impl Into<String>, inner: T) -> (RemoteTask<T>, WorkerReady) {
        let node = node.into();
        let (tx, rx) = oneshot::channel();
        let task = RemoteTask {
            node: node.clone(),
            ready: Some(rx),
            inner,
        };
        (task, WorkerReady { node, tx })
    }

    pub fn node(&self) -> &str {
        &self.node
    }
}

#[async_trait]
impl<T: Task> Task for RemoteTask<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn setup(&mut self) -> Result<()> {
        if let Some(ready) = self.ready.take() {
            debug!(node = %self.node, task = %self.inner.name(), "waiting for remote worker");
            ready
                .await
                .map_err(|_| ExecError::WorkerUnavailable(self.node.clone()))?;
        }
        self.inner.setup().await
    }

    async fn execute(&mut self, input: Option<JobOutput>) -> Result<Option<JobOutput>> {
        self.inner.execute(input).await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}
