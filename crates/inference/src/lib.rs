//! HTTP client for the model-serving inference server.
//!
//! [`InferenceApi`] speaks the server's REST surface; [`HttpInferenceBackend`]
//! adapts it to the core [`InferenceBackend`](vocalis_core::inference::InferenceBackend)
//! trait with the configured model names.

pub mod api;
pub mod backend;

pub use api::{InferenceApi, InferenceApiError};
pub use backend::{HttpInferenceBackend, InferenceConfig};
