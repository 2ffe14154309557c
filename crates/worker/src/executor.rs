//! Per-job execution: resolve, bind, run, persist, complete.
//!
//! Every failure after the job row exists ends in a terminal update with
//! the failure text, so a job never stays incomplete once it has been
//! picked up, even when the store itself fails mid-run. The result row is
//! written before the job is marked successful.

use std::any::Any;
use std::sync::Arc;

use vocalis_core::capability::CapabilityContext;
use vocalis_core::error::CoreError;
use vocalis_core::jobs::{JobManager, JobOutcome};
use vocalis_core::resolver::CapabilityResolver;
use vocalis_core::results::ResultStore;
use vocalis_core::store::{Store, StoreScope};
use vocalis_core::types::DbId;

use crate::engine::EngineError;
use crate::task::ExecutionTask;

pub struct JobExecutor {
    store: Arc<dyn Store>,
    resolver: Arc<CapabilityResolver>,
    context: CapabilityContext,
}

impl JobExecutor {
    pub fn new(
        store: Arc<dyn Store>,
        resolver: Arc<CapabilityResolver>,
        context: CapabilityContext,
    ) -> Self {
        Self {
            store,
            resolver,
            context,
        }
    }

    /// Run one task to its terminal state.
    ///
    /// Refuses to run a job that is missing or already complete; such a
    /// task writes nothing. A job whose scope cannot be opened is marked
    /// failed through a fresh scope, and a terminal update that hits a store
    /// error is retried once on a fresh scope with the same outcome.
    pub async fn run(&self, task: ExecutionTask) -> Result<JobOutcome, EngineError> {
        let job_id = task.job_id;
        let mut scope = match self.open(job_id).await {
            Ok(scope) => scope,
            Err(e) => {
                if matches!(e, EngineError::Store(_)) {
                    self.abandon_job(job_id, &e.to_string()).await;
                }
                return Err(e);
            }
        };

        tracing::info!(
            job_id,
            model_id = task.model_id,
            correlation_id = %task.correlation_id,
            "Job execution started",
        );

        let outcome = self.execute(scope.as_mut(), task).await;
        if let JobOutcome::Failure(detail) = &outcome {
            tracing::warn!(job_id, error = %detail, "Job execution failed");
        }

        match JobManager::mark_terminal(scope.as_mut(), job_id, &outcome).await {
            Ok(()) => Ok(outcome),
            Err(CoreError::Store(e)) => {
                tracing::warn!(job_id, error = %e, "Terminal update failed, retrying");
                drop(scope);
                self.record_terminal(job_id, &outcome).await?;
                Ok(outcome)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Acquire a scope for `job_id`, checking that the job is still open.
    async fn open(&self, job_id: DbId) -> Result<Box<dyn StoreScope>, EngineError> {
        let mut scope = self.store.scope().await?;
        match scope.find_job(job_id).await? {
            None => Err(EngineError::JobMissing(job_id)),
            Some(job) if job.complete => Err(EngineError::AlreadyTerminal(job_id)),
            Some(_) => Ok(scope),
        }
    }

    async fn record_terminal(&self, job_id: DbId, outcome: &JobOutcome) -> Result<(), EngineError> {
        let mut scope = self.store.scope().await?;
        JobManager::mark_terminal(scope.as_mut(), job_id, outcome).await?;
        Ok(())
    }

    /// Mark a task that will never run as failed.
    pub async fn abandon(&self, task: &ExecutionTask, reason: &str) {
        self.abandon_job(task.job_id, reason).await;
    }

    async fn abandon_job(&self, job_id: DbId, reason: &str) {
        let outcome = JobOutcome::Failure(reason.to_string());
        match self.record_terminal(job_id, &outcome).await {
            Ok(()) => tracing::warn!(job_id, reason, "Job abandoned"),
            Err(e) => tracing::error!(job_id, error = %e, "Failed to record abandoned job"),
        }
    }

    async fn execute(&self, scope: &mut dyn StoreScope, task: ExecutionTask) -> JobOutcome {
        let resolved = match self.resolver.resolve(scope, task.model_id).await {
            Ok(resolved) => resolved,
            Err(e) => return JobOutcome::Failure(e.to_string()),
        };

        let job = task.job_context();
        let handler = match self.resolver.bind(&resolved, task.params, &self.context) {
            Ok(handler) => handler,
            Err(e) => return JobOutcome::Failure(e.to_string()),
        };

        // Run on its own task so a panicking handler surfaces as a JoinError.
        let run = tokio::spawn(async move { handler.execute(&job).await }).await;
        let row = match run {
            Ok(Ok(row)) => row,
            Ok(Err(e)) => return JobOutcome::Failure(e.to_string()),
            Err(e) if e.is_panic() => {
                return JobOutcome::Failure(format!(
                    "capability panicked: {}",
                    panic_message(e.into_panic().as_ref())
                ))
            }
            Err(e) => return JobOutcome::Failure(format!("capability task aborted: {e}")),
        };

        match ResultStore::persist(scope, resolved.descriptor, &row).await {
            Ok(()) => JobOutcome::Success,
            Err(e) => JobOutcome::Failure(e.to_string()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
