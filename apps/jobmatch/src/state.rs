use std::sync::Arc;

use tokio::sync::Mutex;

use crate::clustering::PipelineContext;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Fitted vectorizer and model, loaded once at startup.
    pub pipeline: Arc<PipelineContext>,
    /// Serializes merge cycles from this process. Other processes writing the
    /// same store are not coordinated.
    pub merge_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, pipeline: PipelineContext) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            merge_lock: Arc::new(Mutex::new(())),
        }
    }
}
