use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::clustering::artifacts::{load_model, load_vectorizer, save_model, save_vectorizer};
use crate::clustering::kmeans::{ClusterModel, KMeansParams};
use crate::clustering::vectorizer::SkillVectorizer;
use crate::errors::PipelineError;
use crate::models::posting::{JobRecord, RawPosting};

/// The fitted vectorizer and cluster model, loaded once per process and
/// passed explicitly to whatever needs to label postings.
///
/// Construction guarantees both halves are fitted and share one vector space,
/// so `label` can only fail on I/O-free contract errors.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    vectorizer: SkillVectorizer,
    model: ClusterModel,
}

impl PipelineContext {
    pub fn new(vectorizer: SkillVectorizer, model: ClusterModel) -> Result<Self, PipelineError> {
        let vocabulary = vectorizer.dimension()?;
        let dimension = model.dimension()?;
        if vocabulary != dimension {
            return Err(PipelineError::ArtifactMismatch(format!(
                "vectorizer has {vocabulary} tokens but model centroids have dimension {dimension}"
            )));
        }
        Ok(Self { vectorizer, model })
    }

    pub fn load(vectorizer_path: &Path, model_path: &Path) -> Result<Self, PipelineError> {
        Self::new(load_vectorizer(vectorizer_path)?, load_model(model_path)?)
    }

    pub fn save(&self, vectorizer_path: &Path, model_path: &Path) -> Result<(), PipelineError> {
        let trained_at = Utc::now();
        save_vectorizer(&self.vectorizer, trained_at, vectorizer_path)?;
        save_model(&self.model, trained_at, model_path)
    }

    /// Offline retraining: fits a fresh vectorizer and model on `postings`
    /// and returns them with the training set labeled by the winning partition.
    pub fn train(
        postings: Vec<RawPosting>,
        params: KMeansParams,
    ) -> Result<(Self, Vec<JobRecord>), PipelineError> {
        let corpus: Vec<String> = postings.iter().map(RawPosting::normalized_skills).collect();

        let mut vectorizer = SkillVectorizer::default();
        let rows = vectorizer.fit_transform(&corpus)?;
        info!(
            "Vectorized {} postings into {} skill dimensions",
            rows.len(),
            vectorizer.dimension()?
        );

        let mut model = ClusterModel::new(params);
        let labels = model.fit(&rows)?;

        let records = postings
            .into_iter()
            .zip(labels)
            .map(|(raw, label)| JobRecord::from_raw(raw, label as u32))
            .collect();

        Ok((Self::new(vectorizer, model)?, records))
    }

    /// Normalizes, vectorizes, and assigns a cluster to each posting
    /// using the frozen model.
    pub fn label(&self, batch: Vec<RawPosting>) -> Result<Vec<JobRecord>, PipelineError> {
        batch
            .into_iter()
            .map(|raw| {
                let vector = self.vectorizer.transform(&raw.normalized_skills())?;
                let cluster = self.model.predict(&vector)?;
                Ok(JobRecord::from_raw(raw, cluster as u32))
            })
            .collect()
    }

    pub fn vectorizer(&self) -> &SkillVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &ClusterModel {
        &self.model
    }
}
