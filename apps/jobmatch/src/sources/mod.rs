//! Job sources: whatever produces raw postings.
//!
//! Scraping lives behind `JobSource`; the pipeline only sees `RawPosting`.
//! `CsvJobSource` reads a scraper's CSV export and is what the CLI uses.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::errors::PipelineError;
use crate::models::posting::RawPosting;
use crate::store::batch::read_batch;

#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawPosting>, PipelineError>;
}

/// Reads postings from a CSV file with `Title, Company, Location, Skills`
/// and an optional `Date` column.
pub struct CsvJobSource {
    path: PathBuf,
}

impl CsvJobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobSource for CsvJobSource {
    async fn fetch(&self) -> Result<Vec<RawPosting>, PipelineError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let postings = read_batch(bytes.as_slice())?;
        info!("Fetched {} postings from {}", postings.len(), self.path.display());
        Ok(postings)
    }
}
