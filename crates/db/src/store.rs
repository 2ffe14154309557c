//! [`Store`] implementation over a PostgreSQL pool.
//!
//! A [`PgScope`] owns one pooled connection for its lifetime; the
//! connection returns to the pool when the scope is dropped.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use vocalis_core::jobs::{Job, NewJob};
use vocalis_core::models::Model;
use vocalis_core::results::{ResultRow, ResultTable};
use vocalis_core::store::{Store, StoreError, StoreScope};
use vocalis_core::types::DbId;

use crate::repositories::{JobRepo, MlModelRepo, SaResultRepo, SttResultRepo};
use crate::DbPool;

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn scope(&self) -> Result<Box<dyn StoreScope>, StoreError> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgScope { conn }))
    }
}

pub struct PgScope {
    conn: PoolConnection<Postgres>,
}

/// Map a sqlx error onto the store's error kinds.
///
/// Unique violations on `uq_`/`pk_` constraints become `Conflict`.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") || constraint.starts_with("pk_") {
                return StoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    StoreError::backend(err)
}

#[async_trait]
impl StoreScope for PgScope {
    async fn ping(&mut self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&mut *self.conn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_model(&mut self, name: &str) -> Result<Model, StoreError> {
        MlModelRepo::create(&mut self.conn, name)
            .await
            .map(Model::from)
            .map_err(map_sqlx_error)
    }

    async fn find_model(&mut self, id: DbId) -> Result<Option<Model>, StoreError> {
        MlModelRepo::find_by_id(&mut self.conn, id)
            .await
            .map(|row| row.map(Model::from))
            .map_err(map_sqlx_error)
    }

    async fn list_models(&mut self) -> Result<Vec<Model>, StoreError> {
        MlModelRepo::list(&mut self.conn)
            .await
            .map(|rows| rows.into_iter().map(Model::from).collect())
            .map_err(map_sqlx_error)
    }

    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, StoreError> {
        JobRepo::create(&mut self.conn, job)
            .await
            .map(Job::from)
            .map_err(map_sqlx_error)
    }

    async fn find_job(&mut self, id: DbId) -> Result<Option<Job>, StoreError> {
        JobRepo::find_by_id(&mut self.conn, id)
            .await
            .map(|row| row.map(Job::from))
            .map_err(map_sqlx_error)
    }

    async fn list_jobs(
        &mut self,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<Job>, StoreError> {
        JobRepo::list_by_correlation(&mut self.conn, model_id, correlation_id)
            .await
            .map(|rows| rows.into_iter().map(Job::from).collect())
            .map_err(map_sqlx_error)
    }

    async fn complete_job(&mut self, id: DbId, message: &str) -> Result<bool, StoreError> {
        JobRepo::complete(&mut self.conn, id, message)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_result(&mut self, row: &ResultRow) -> Result<(), StoreError> {
        match row {
            ResultRow::Stt(row) => SttResultRepo::insert(&mut self.conn, row).await,
            ResultRow::Sa(row) => SaResultRepo::insert(&mut self.conn, row).await,
        }
        .map_err(map_sqlx_error)
    }

    async fn list_results(
        &mut self,
        table: ResultTable,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<ResultRow>, StoreError> {
        let rows = match table {
            ResultTable::Stt => SttResultRepo::list_by_correlation(&mut self.conn, model_id, correlation_id)
                .await
                .map(|rows| rows.into_iter().map(|r| ResultRow::Stt(r.into())).collect()),
            ResultTable::Sa => SaResultRepo::list_by_correlation(&mut self.conn, model_id, correlation_id)
                .await
                .map(|rows| rows.into_iter().map(|r| ResultRow::Sa(r.into())).collect()),
        };
        rows.map_err(map_sqlx_error)
    }
}
