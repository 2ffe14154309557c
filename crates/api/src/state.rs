use std::sync::Arc;

use vocalis_core::resolver::CapabilityResolver;
use vocalis_core::store::Store;
use vocalis_worker::ExecutionEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Source of per-request store scopes.
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    /// Model id → capability resolution over the loaded registry.
    pub resolver: Arc<CapabilityResolver>,
    /// Submission handle of the background execution engine.
    pub engine: ExecutionEngine,
}
