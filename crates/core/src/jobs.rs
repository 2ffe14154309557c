//! Job records and the Job Manager.
//!
//! A job is created incomplete with a placeholder message and is completed
//! exactly once, either successfully or with the failure text:
//!
//! ```text
//! Created (complete = false) ──► Completed-Success  (message = "successful")
//!                            └─► Completed-Failure  (message = "failed: <detail>")
//! ```
//!
//! Both terminal states are absorbing. The store only applies the terminal
//! update to an incomplete row, so a second attempt is a `Conflict`.

use serde::Serialize;

use crate::error::CoreError;
use crate::store::StoreScope;
use crate::types::{DbId, Timestamp};

/// The only transaction kind recorded for inference jobs.
pub const TRANSACTION_REPLY: &str = "reply";

/// Placeholder message while a job is running.
pub const MESSAGE_IN_PROGRESS: &str = "in progress";

/// Message of a successfully completed job.
pub const MESSAGE_SUCCESS: &str = "successful";

/// Prefix of a failed job's message.
pub const MESSAGE_FAILURE_PREFIX: &str = "failed";

/// A row from the `ml_models_inference` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: DbId,
    pub model_id: DbId,
    pub file_name: String,
    pub correlation_id: String,
    pub transaction: String,
    pub complete: bool,
    pub message: Option<String>,
    pub updated_at: Timestamp,
}

/// Insert DTO for a new job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub model_id: DbId,
    pub correlation_id: String,
    pub file_name: String,
    pub transaction: String,
    pub message: String,
}

/// Progress block of a [`JobSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub complete: bool,
    pub message: Option<String>,
}

/// Caller-facing view of a job, as returned by status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: DbId,
    pub model_id: DbId,
    pub transaction: String,
    pub updated_at: Timestamp,
    pub correlation_id: String,
    pub progress: JobProgress,
    pub file_name: String,
}

impl From<Job> for JobSnapshot {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            model_id: job.model_id,
            transaction: job.transaction,
            updated_at: job.updated_at,
            correlation_id: job.correlation_id,
            progress: JobProgress {
                complete: job.complete,
                message: job.message,
            },
            file_name: job.file_name,
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The message stored on the job.
    pub fn message(&self) -> String {
        match self {
            Self::Success => MESSAGE_SUCCESS.to_string(),
            Self::Failure(detail) => format!("{MESSAGE_FAILURE_PREFIX}: {detail}"),
        }
    }
}

/// Creates and completes jobs.
pub struct JobManager;

impl JobManager {
    /// Insert a new incomplete job.
    pub async fn create(
        scope: &mut dyn StoreScope,
        model_id: DbId,
        correlation_id: &str,
        file_name: &str,
    ) -> Result<Job, CoreError> {
        let job = scope
            .insert_job(&NewJob {
                model_id,
                correlation_id: correlation_id.to_string(),
                file_name: file_name.to_string(),
                transaction: TRANSACTION_REPLY.to_string(),
                message: MESSAGE_IN_PROGRESS.to_string(),
            })
            .await?;

        tracing::info!(
            job_id = job.id,
            model_id,
            correlation_id,
            file_name,
            "Job created",
        );
        Ok(job)
    }

    /// Move a job to its terminal state.
    ///
    /// Fails with `NotFound` for an unknown id and `Conflict` if the job is
    /// already complete; in both cases nothing is written.
    pub async fn mark_terminal(
        scope: &mut dyn StoreScope,
        job_id: DbId,
        outcome: &JobOutcome,
    ) -> Result<(), CoreError> {
        let message = outcome.message();
        if scope.complete_job(job_id, &message).await? {
            tracing::info!(job_id, success = outcome.is_success(), message = %message, "Job completed");
            return Ok(());
        }

        match scope.find_job(job_id).await? {
            Some(_) => Err(CoreError::Conflict(format!(
                "Job {job_id} is already in a terminal state"
            ))),
            None => Err(CoreError::NotFound {
                entity: "Job",
                id: job_id,
            }),
        }
    }
}
