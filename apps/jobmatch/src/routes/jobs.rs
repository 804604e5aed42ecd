//! Axum route handlers for the Jobs API.
//!
//! Store I/O and labeling are blocking, so handlers run them on `spawn_blocking`.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::matching::{match_postings, SkillQuery};
use crate::models::posting::{JobRecord, RawPosting};
use crate::store::{run_merge_cycle, JobStore, LoadOutcome, MergeReport};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub load: LoadOutcome,
    pub total: usize,
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Deserialize)]
pub struct MatchParams {
    /// Comma-separated skill phrases.
    pub skills: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub load: LoadOutcome,
    pub query: Vec<String>,
    pub count: usize,
    pub jobs: Vec<JobRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs
///
/// Returns the whole de-duplicated store and how it was loaded.
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<JobsResponse>, AppError> {
    let path = state.config.store_path.clone();
    let (store, load) = blocking(move || Ok(JobStore::load(&path))).await?;

    Ok(Json(JobsResponse {
        load,
        total: store.len(),
        jobs: store.records().to_vec(),
    }))
}

/// POST /api/v1/jobs/merge
///
/// Labels the posted batch with the loaded model and merges it into the store.
pub async fn handle_merge(
    State(state): State<AppState>,
    Json(batch): Json<Vec<RawPosting>>,
) -> Result<Json<MergeReport>, AppError> {
    let pipeline = state.pipeline.clone();
    let path = state.config.store_path.clone();
    let report = blocking_locked(state.merge_lock.clone(), move || {
        Ok(run_merge_cycle(&pipeline, &path, batch)?)
    })
    .await?;

    Ok(Json(report))
}

/// GET /api/v1/jobs/match?skills=python,sql
///
/// Postings whose skills contain any of the given phrases. An empty result is not an error.
pub async fn handle_match(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchResponse>, AppError> {
    let query = SkillQuery::parse(&params.skills);
    if query.is_empty() {
        return Err(AppError::Validation("skills cannot be empty".to_string()));
    }

    let path = state.config.store_path.clone();
    let (store, load) = blocking(move || Ok(JobStore::load(&path))).await?;
    let jobs: Vec<JobRecord> = match_postings(store.records(), &query)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(MatchResponse {
        load,
        query: query.phrases().to_vec(),
        count: jobs.len(),
        jobs,
    }))
}

/// Like `blocking`, but the lock guard moves into the blocking task and is
/// released only when `f` returns, even if the request future is dropped.
async fn blocking_locked<T, F>(lock: Arc<Mutex<()>>, f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let guard = lock.lock_owned().await;
    blocking(move || {
        let _guard = guard;
        f()
    })
    .await
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed: {e}")))?
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
