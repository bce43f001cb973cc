use crate::observability::AppMetrics;
use crate::services::orchestrator::Orchestrator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Reaction pipeline: dispatcher, adapter cache, memory store and generation
    pub orchestrator: Arc<Orchestrator>,
    /// Request and pipeline counters
    pub metrics: Arc<AppMetrics>,
    /// Service version reported by the banner and health check
    pub version: String,
    pub start_time: DateTime<Utc>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &"Arc<Orchestrator>")
            .field("metrics", &self.metrics)
            .field("version", &self.version)
            .field("start_time", &self.start_time)
            .finish()
    }
}

impl AppState {
    /// Create new application state, sharing the orchestrator's metrics
    pub fn new(orchestrator: Orchestrator) -> Self {
        let metrics = orchestrator.metrics();
        Self {
            orchestrator: Arc::new(orchestrator),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
