//! In-process [`Store`] backed by a mutex-guarded state.
//!
//! Behaves like the PostgreSQL store for everything the core relies on:
//! model ids start at 1001, model names and result keys are unique, and the
//! terminal job update only applies to incomplete rows. Used by tests and by
//! local runs without a database.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{Store, StoreError, StoreScope};
use crate::jobs::{Job, NewJob};
use crate::models::{Model, FIRST_MODEL_ID};
use crate::results::{ResultRow, ResultTable};
use crate::types::DbId;

#[derive(Debug)]
struct State {
    models: Vec<Model>,
    jobs: Vec<Job>,
    results: Vec<ResultRow>,
    next_model_id: DbId,
    next_job_id: DbId,
}

impl Default for State {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            jobs: Vec::new(),
            results: Vec::new(),
            next_model_id: FIRST_MODEL_ID,
            next_job_id: 1,
        }
    }
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of result rows across all tables.
    pub fn result_count(&self) -> usize {
        lock(&self.state).results.len()
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Store for MemoryStore {
    async fn scope(&self) -> Result<Box<dyn StoreScope>, StoreError> {
        Ok(Box::new(MemoryScope {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryScope {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl StoreScope for MemoryScope {
    async fn ping(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_model(&mut self, name: &str) -> Result<Model, StoreError> {
        let mut state = lock(&self.state);
        if state.models.iter().any(|m| m.ml_model_name == name) {
            return Err(StoreError::Conflict(format!(
                "Model name '{name}' already exists"
            )));
        }
        let model = Model {
            id: state.next_model_id,
            ml_model_name: name.to_string(),
        };
        state.next_model_id += 1;
        state.models.push(model.clone());
        Ok(model)
    }

    async fn find_model(&mut self, id: DbId) -> Result<Option<Model>, StoreError> {
        Ok(lock(&self.state).models.iter().find(|m| m.id == id).cloned())
    }

    async fn list_models(&mut self) -> Result<Vec<Model>, StoreError> {
        Ok(lock(&self.state).models.clone())
    }

    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, StoreError> {
        let mut state = lock(&self.state);
        let row = Job {
            id: state.next_job_id,
            model_id: job.model_id,
            file_name: job.file_name.clone(),
            correlation_id: job.correlation_id.clone(),
            transaction: job.transaction.clone(),
            complete: false,
            message: Some(job.message.clone()),
            updated_at: Utc::now(),
        };
        state.next_job_id += 1;
        state.jobs.push(row.clone());
        Ok(row)
    }

    async fn find_job(&mut self, id: DbId) -> Result<Option<Job>, StoreError> {
        Ok(lock(&self.state).jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_jobs(
        &mut self,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<Job>, StoreError> {
        Ok(lock(&self.state)
            .jobs
            .iter()
            .filter(|j| j.model_id == model_id && j.correlation_id == correlation_id)
            .cloned()
            .collect())
    }

    async fn complete_job(&mut self, id: DbId, message: &str) -> Result<bool, StoreError> {
        let mut state = lock(&self.state);
        match state.jobs.iter_mut().find(|j| j.id == id && !j.complete) {
            Some(job) => {
                job.complete = true;
                job.message = Some(message.to_string());
                job.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_result(&mut self, row: &ResultRow) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        let duplicate = state.results.iter().any(|r| {
            r.table() == row.table() && r.job_id() == row.job_id() && r.model_id() == row.model_id()
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "Result for job {} and model {} already exists in {}",
                row.job_id(),
                row.model_id(),
                row.table().name(),
            )));
        }
        state.results.push(row.clone());
        Ok(())
    }

    async fn list_results(
        &mut self,
        table: ResultTable,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<ResultRow>, StoreError> {
        Ok(lock(&self.state)
            .results
            .iter()
            .filter(|r| {
                r.table() == table && r.model_id() == model_id && r.correlation_id() == correlation_id
            })
            .cloned()
            .collect())
    }
}
