//! Query Service: status and result reads keyed by model id and
//! correlation id.

use crate::error::CoreError;
use crate::jobs::JobSnapshot;
use crate::resolver::CapabilityResolver;
use crate::results::{ProjectedRow, ResultStore};
use crate::store::StoreScope;
use crate::types::DbId;

pub struct QueryService;

impl QueryService {
    /// Snapshots of every job for `(model_id, correlation_id)`, oldest first.
    ///
    /// An empty list is a valid answer; the model does not need a
    /// descriptor for its jobs to be listed.
    pub async fn status(
        scope: &mut dyn StoreScope,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<JobSnapshot>, CoreError> {
        let jobs = scope.list_jobs(model_id, correlation_id).await?;
        Ok(jobs.into_iter().map(JobSnapshot::from).collect())
    }

    /// Result rows for `(model_id, correlation_id)` projected to the model's
    /// output columns.
    ///
    /// Fails with `NotRegistered` when the model cannot be resolved and
    /// `NoResults` when no row matches.
    pub async fn results(
        scope: &mut dyn StoreScope,
        resolver: &CapabilityResolver,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<ProjectedRow>, CoreError> {
        let resolved = resolver.resolve(scope, model_id).await?;
        ResultStore::query(scope, model_id, correlation_id, resolved.descriptor).await
    }
}
