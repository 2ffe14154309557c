//! Zero-sized repositories, one per table.
//!
//! Every method takes the connection it runs on so that a caller's scope
//! decides which pooled connection a statement uses.

pub mod job_repo;
pub mod ml_model_repo;
pub mod result_repo;

pub use job_repo::JobRepo;
pub use ml_model_repo::MlModelRepo;
pub use result_repo::{SaResultRepo, SttResultRepo};
