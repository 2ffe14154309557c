use vocalis_core::capability::{CapabilityParams, JobContext};
use vocalis_core::types::DbId;

/// One accepted submission waiting to run.
///
/// Owns everything the run needs; no request-scoped state crosses into the
/// engine.
#[derive(Clone)]
pub struct ExecutionTask {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
    pub params: CapabilityParams,
}

impl ExecutionTask {
    pub fn job_context(&self) -> JobContext {
        JobContext {
            job_id: self.job_id,
            model_id: self.model_id,
            correlation_id: self.correlation_id.clone(),
        }
    }
}

impl std::fmt::Debug for ExecutionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionTask")
            .field("job_id", &self.job_id)
            .field("model_id", &self.model_id)
            .field("correlation_id", &self.correlation_id)
            .field("params", &self.params.names().collect::<Vec<_>>())
            .finish()
    }
}
