//! Persistence seam.
//!
//! [`Store`] is shared process-wide and only hands out scopes. A
//! [`StoreScope`] is the per-request / per-task session: it is acquired
//! inside the request handler or the worker task that uses it and is never
//! passed across the boundary between them. For PostgreSQL a scope owns one
//! pooled connection.
//!
//! Every operation is expected to be consistent on its own; nothing here
//! spans several entities in one transaction.

pub mod memory;

use async_trait::async_trait;

use crate::jobs::{Job, NewJob};
use crate::models::Model;
use crate::results::{ResultRow, ResultTable};
use crate::types::DbId;

pub use memory::MemoryStore;

/// Errors raised by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection lost, query error, ...).
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Source of store scopes.
#[async_trait]
pub trait Store: Send + Sync {
    async fn scope(&self) -> Result<Box<dyn StoreScope>, StoreError>;
}

/// One session against the persistent store.
#[async_trait]
pub trait StoreScope: Send {
    /// Cheap round-trip used by health checks.
    async fn ping(&mut self) -> Result<(), StoreError>;

    // --- models ---

    /// Register a model name. Fails with `Conflict` if the name exists.
    async fn insert_model(&mut self, name: &str) -> Result<Model, StoreError>;

    async fn find_model(&mut self, id: DbId) -> Result<Option<Model>, StoreError>;

    /// All models, ordered by id.
    async fn list_models(&mut self) -> Result<Vec<Model>, StoreError>;

    // --- jobs ---

    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, StoreError>;

    async fn find_job(&mut self, id: DbId) -> Result<Option<Job>, StoreError>;

    /// Jobs for `(model_id, correlation_id)`, ordered by id.
    async fn list_jobs(&mut self, model_id: DbId, correlation_id: &str)
        -> Result<Vec<Job>, StoreError>;

    /// Set `complete = true`, the message and `updated_at`, but only if the
    /// job is still incomplete. Returns whether a row changed.
    async fn complete_job(&mut self, id: DbId, message: &str) -> Result<bool, StoreError>;

    // --- results ---

    /// Append a row to its table. Fails with `Conflict` on a duplicate
    /// `(job_id, model_id)`.
    async fn insert_result(&mut self, row: &ResultRow) -> Result<(), StoreError>;

    /// Rows of `table` for `(model_id, correlation_id)` in insertion order.
    async fn list_results(
        &mut self,
        table: ResultTable,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<ResultRow>, StoreError>;
}
