use std::sync::Arc;

use storyreel_core::GenerationService;
use storyreel_events::RunBus;
use storyreel_pipeline::RunRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (all inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// In-memory store of run snapshots (the authoritative state).
    pub registry: Arc<RunRegistry>,
    /// Progress event bus (pipeline publishes, SSE clients subscribe).
    pub bus: Arc<RunBus>,
    /// External generation service; the Gemini client in production,
    /// a mock in integration tests.
    pub service: Arc<dyn GenerationService>,
}
