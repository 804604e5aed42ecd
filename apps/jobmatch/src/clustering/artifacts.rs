//! Versioned JSON artifacts for the fitted vectorizer and cluster model.
//!
//! The vectorizer artifact stores the tokenizer by registry name plus the
//! vocabulary in index order. The model artifact stores exact centroid
//! coordinates. Both are written atomically.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clustering::kmeans::{Centroids, ClusterModel, KMeansParams};
use crate::clustering::tokenizer::TokenizerId;
use crate::clustering::vectorizer::SkillVectorizer;
use crate::errors::PipelineError;
use crate::persist::write_atomic;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub format_version: u32,
    /// Serialized as its registry name; an unknown name fails deserialization.
    pub tokenizer: TokenizerId,
    pub trained_at: DateTime<Utc>,
    pub vocabulary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub params: KMeansParams,
    pub centroids: Centroids,
}

pub fn save_vectorizer(
    vectorizer: &SkillVectorizer,
    trained_at: DateTime<Utc>,
    path: &Path,
) -> Result<(), PipelineError> {
    let vocabulary = vectorizer
        .vocabulary()
        .ok_or(PipelineError::NotFitted("SkillVectorizer"))?;
    let artifact = VectorizerArtifact {
        format_version: FORMAT_VERSION,
        tokenizer: vectorizer.tokenizer(),
        trained_at,
        vocabulary: vocabulary.tokens().to_vec(),
    };
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, &artifact)?))?;
    info!(
        "Saved vectorizer ({} tokens) to {}",
        artifact.vocabulary.len(),
        path.display()
    );
    Ok(())
}

pub fn load_vectorizer(path: &Path) -> Result<SkillVectorizer, PipelineError> {
    let artifact: VectorizerArtifact = serde_json::from_slice(&fs::read(path)?)?;
    check_version(artifact.format_version, path)?;
    let tokenizer = artifact.tokenizer;
    let vectorizer = SkillVectorizer::from_parts(tokenizer, artifact.vocabulary)?;
    info!(
        "Loaded vectorizer ({} tokens, tokenizer {tokenizer}) from {}",
        vectorizer.dimension()?,
        path.display()
    );
    Ok(vectorizer)
}

pub fn save_model(
    model: &ClusterModel,
    trained_at: DateTime<Utc>,
    path: &Path,
) -> Result<(), PipelineError> {
    let centroids = model
        .centroids()
        .ok_or(PipelineError::NotFitted("ClusterModel"))?;
    let artifact = ModelArtifact {
        format_version: FORMAT_VERSION,
        trained_at,
        params: model.params().clone(),
        centroids: centroids.clone(),
    };
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, &artifact)?))?;
    info!(
        "Saved k-means model (k={}) to {}",
        artifact.params.k,
        path.display()
    );
    Ok(())
}

pub fn load_model(path: &Path) -> Result<ClusterModel, PipelineError> {
    let artifact: ModelArtifact = serde_json::from_slice(&fs::read(path)?)?;
    check_version(artifact.format_version, path)?;
    let model = ClusterModel::from_centroids(artifact.params, artifact.centroids)?;
    info!(
        "Loaded k-means model (k={}, dimension {}) from {}",
        model.params().k,
        model.dimension()?,
        path.display()
    );
    Ok(model)
}

fn check_version(found: u32, path: &Path) -> Result<(), PipelineError> {
    if found != FORMAT_VERSION {
        return Err(PipelineError::ArtifactMismatch(format!(
            "{} has format version {found}, expected {FORMAT_VERSION}",
            path.display()
        )));
    }
    Ok(())
}
