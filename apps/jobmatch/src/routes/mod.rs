pub mod health;
pub mod jobs;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/merge", post(jobs::handle_merge))
        .route("/api/v1/jobs/match", get(jobs::handle_match))
        .with_state(state)
}
