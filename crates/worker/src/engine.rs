//! Bounded dispatch queue and worker pool.
//!
//! [`ExecutionEngine::submit`] never waits: a full queue is an immediate
//! [`EngineError::QueueFull`]. The dispatcher holds a semaphore permit per
//! running job. On cancellation it stops taking new work, marks queued
//! tasks failed, and waits for running jobs to finish.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use vocalis_core::error::CoreError;
use vocalis_core::store::StoreError;
use vocalis_core::types::DbId;

use crate::executor::JobExecutor;
use crate::task::ExecutionTask;

/// Default number of jobs executing at once.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Default number of accepted jobs waiting for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Failure reason recorded for tasks still queued at shutdown.
pub const SHUTDOWN_REASON: &str = "execution engine shut down before the job started";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub concurrency: usize,
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Execution queue is full")]
    QueueFull,

    #[error("Execution engine has stopped")]
    Stopped,

    #[error("Job {0} is already in a terminal state")]
    AlreadyTerminal(DbId),

    #[error("Job {0} does not exist")]
    JobMissing(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Handle for submitting tasks. Clones share one queue.
#[derive(Clone)]
pub struct ExecutionEngine {
    sender: mpsc::Sender<ExecutionTask>,
}

impl ExecutionEngine {
    /// Spawn the dispatcher. The returned handle resolves once the
    /// dispatcher has drained the queue and every running job has finished.
    pub fn start(
        executor: Arc<JobExecutor>,
        config: EngineConfig,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let concurrency = config.concurrency.max(1);

        let handle = tokio::spawn(dispatch(executor, receiver, concurrency, cancel));
        tracing::info!(
            concurrency,
            queue_capacity = config.queue_capacity,
            "Execution engine started",
        );

        (Self { sender }, handle)
    }

    /// Enqueue a task without waiting.
    pub fn submit(&self, task: ExecutionTask) -> Result<(), EngineError> {
        let job_id = task.job_id;
        self.sender.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EngineError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EngineError::Stopped,
        })?;
        tracing::debug!(job_id, "Job queued for execution");
        Ok(())
    }
}

async fn dispatch(
    executor: Arc<JobExecutor>,
    mut receiver: mpsc::Receiver<ExecutionTask>,
    concurrency: usize,
    cancel: CancellationToken,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let tracker = TaskTracker::new();

    loop {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            task = receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let executor = Arc::clone(&executor);
        tracker.spawn(async move {
            let _permit = permit;
            let job_id = task.job_id;
            match executor.run(task).await {
                Ok(outcome) => {
                    tracing::debug!(job_id, success = outcome.is_success(), "Job finished");
                }
                Err(e) => tracing::error!(job_id, error = %e, "Job was not executed"),
            }
        });
    }

    tracing::info!("Execution engine shutting down");

    receiver.close();
    let mut abandoned = 0usize;
    while let Some(task) = receiver.recv().await {
        executor.abandon(&task, SHUTDOWN_REASON).await;
        abandoned += 1;
    }

    tracker.close();
    tracing::info!(
        abandoned,
        running = tracker.len(),
        "Waiting for running jobs to finish",
    );
    tracker.wait().await;
    tracing::info!("Execution engine stopped");
}
