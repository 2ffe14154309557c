//! Execution Engine: runs accepted jobs off the request path.
//!
//! The API creates the job row and hands an [`ExecutionTask`] to the
//! [`ExecutionEngine`]. A single dispatcher task pulls tasks off a bounded
//! queue and runs each one on its own Tokio task under a concurrency limit;
//! [`JobExecutor`] does the per-job work against a fresh store scope.

pub mod engine;
pub mod executor;
pub mod task;

pub use engine::{EngineConfig, EngineError, ExecutionEngine};
pub use executor::JobExecutor;
pub use task::ExecutionTask;
