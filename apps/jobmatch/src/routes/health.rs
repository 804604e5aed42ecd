use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the shape of the loaded model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobmatch",
        "clusters": state.pipeline.model().params().k,
        "vocabulary_size": state.pipeline.vectorizer().vocabulary().map_or(0, |v| v.len()),
    }))
}
