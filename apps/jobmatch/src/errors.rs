#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the clustering and store pipeline.
///
/// Contract violations (`NotFitted`, `InvalidClusterCount`, `DimensionMismatch`)
/// are surfaced to the caller as-is. `StoreUnreadable` is caught by the store
/// loader and converted into an explicit recovered-empty state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("{0} used before fit")]
    NotFitted(&'static str),

    #[error("Invalid cluster count {k} for {rows} training rows")]
    InvalidClusterCount { k: usize, rows: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Job store at {} is unreadable: {reason}", .path.display())]
    StoreUnreadable { path: PathBuf, reason: String },

    #[error("Input batch is missing required column '{0}'")]
    MissingInputColumn(String),

    #[error("Invalid store row: {0}")]
    InvalidRow(String),

    #[error("Unknown tokenizer '{0}'")]
    UnknownTokenizer(String),

    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// HTTP-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(e) => match e {
                PipelineError::MissingInputColumn(_)
                | PipelineError::DimensionMismatch { .. }
                | PipelineError::InvalidClusterCount { .. }
                | PipelineError::EmptyTrainingSet => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    e.to_string(),
                ),
                PipelineError::NotFitted(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "MODEL_NOT_READY",
                    e.to_string(),
                ),
                _ => {
                    tracing::error!("Pipeline error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PIPELINE_ERROR",
                        "A storage or model error occurred".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
