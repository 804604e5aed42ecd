use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::clustering::PipelineContext;
use crate::errors::PipelineError;
use crate::models::posting::RawPosting;
use crate::store::job_store::{JobStore, LoadOutcome, MergeStats};

/// Outcome of one merge cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub load: LoadOutcome,
    pub batch_size: usize,
    #[serde(flatten)]
    pub stats: MergeStats,
    pub total: usize,
    /// False when the cycle left the store file untouched.
    pub persisted: bool,
    /// Where an unreadable store file was moved before being replaced.
    pub quarantined: Option<PathBuf>,
}

/// Loads the store, labels `batch` with the frozen model, upserts it, and
/// persists the result atomically.
///
/// An empty batch, or one that changes nothing in an existing store, does
/// not rewrite the file.
pub fn run_merge_cycle(
    ctx: &PipelineContext,
    store_path: &Path,
    batch: Vec<RawPosting>,
) -> Result<MergeReport, PipelineError> {
    let (mut store, load) = JobStore::load(store_path);
    let batch_size = batch.len();

    if batch.is_empty() {
        info!("Empty batch; job store left untouched");
        return Ok(MergeReport {
            load,
            batch_size,
            stats: MergeStats::default(),
            total: store.len(),
            persisted: false,
            quarantined: None,
        });
    }

    let labeled = ctx.label(batch)?;
    let stats = store.merge(labeled);

    let changed = stats.inserted + stats.updated > 0;
    let persisted = changed || !matches!(load, LoadOutcome::Loaded { .. });
    let mut quarantined = None;
    if persisted {
        if load.is_recovered_empty() {
            quarantined = Some(quarantine(store_path)?);
        }
        store.save(store_path)?;
    }

    info!(
        "Merge cycle: {} inserted, {} updated, {} unchanged; {} unique jobs",
        stats.inserted,
        stats.updated,
        stats.unchanged,
        store.len()
    );

    Ok(MergeReport {
        load,
        batch_size,
        stats,
        total: store.len(),
        persisted,
        quarantined,
    })
}

/// Moves an unreadable store aside before it is replaced.
fn quarantine(store_path: &Path) -> Result<PathBuf, PipelineError> {
    let name = store_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jobs.csv".to_string());
    let target = store_path.with_file_name(format!(
        "{name}.corrupt-{}",
        Utc::now().format("%Y%m%dT%H%M%S%.3f")
    ));
    fs::rename(store_path, &target)?;
    warn!(
        "Moved unreadable job store {} to {}",
        store_path.display(),
        target.display()
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::context::tests::{posting, trained_context};

    fn batch() -> Vec<RawPosting> {
        vec![
            posting("Data Scientist", "Acme", "Python, SQL"),
            posting("Sales Rep", "Delta", "Sales, CRM"),
        ]
    }

    #[test]
    fn test_first_cycle_creates_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let ctx = trained_context();

        let report = run_merge_cycle(&ctx, &path, batch()).unwrap();

        assert_eq!(report.load, LoadOutcome::Missing);
        assert_eq!(report.stats.inserted, 2);
        assert_eq!(report.total, 2);
        assert!(report.persisted);
        assert_eq!(JobStore::read(&path).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_repeated_cycle_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let ctx = trained_context();

        run_merge_cycle(&ctx, &path, batch()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        let report = run_merge_cycle(&ctx, &path, batch()).unwrap();

        assert_eq!(report.stats.unchanged, 2);
        assert!(!report.persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_rescrape_overrides_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let ctx = trained_context();

        run_merge_cycle(&ctx, &path, batch()).unwrap();
        let updated = vec![posting("Sales Rep", "Delta", "Marketing, SEO")];
        let report = run_merge_cycle(&ctx, &path, updated).unwrap();

        assert_eq!(report.stats.updated, 1);
        assert_eq!(report.total, 2);
        let store = JobStore::read(&path).unwrap().unwrap();
        let key = posting("Sales Rep", "Delta", "").dedup_key();
        assert_eq!(store.get(&key).unwrap().skills, "marketing, seo");
    }

    #[test]
    fn test_rerun_with_repeated_key_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let ctx = trained_context();
        let batch = vec![
            posting("Data Scientist", "Acme", "Python"),
            posting("Data Scientist", "Acme", "Python, SQL"),
        ];

        run_merge_cycle(&ctx, &path, batch.clone()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        let report = run_merge_cycle(&ctx, &path, batch).unwrap();

        assert_eq!(report.batch_size, 2);
        assert_eq!(report.stats.unchanged, 1);
        assert_eq!(report.stats.updated, 0);
        assert!(!report.persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_empty_batch_does_not_touch_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let ctx = trained_context();

        let report = run_merge_cycle(&ctx, &path, vec![]).unwrap();

        assert!(!report.persisted);
        assert_eq!(report.total, 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_store_is_quarantined_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        fs::write(&path, "this is not a job store\n").unwrap();
        let ctx = trained_context();

        let report = run_merge_cycle(&ctx, &path, batch()).unwrap();

        assert!(report.load.is_recovered_empty());
        let moved = report.quarantined.unwrap();
        assert_eq!(
            fs::read_to_string(&moved).unwrap(),
            "this is not a job store\n"
        );
        assert_eq!(JobStore::read(&path).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_report_serializes_flat_counts() {
        let report = MergeReport {
            load: LoadOutcome::Loaded { rows: 3 },
            batch_size: 1,
            stats: MergeStats {
                inserted: 1,
                updated: 0,
                unchanged: 0,
            },
            total: 4,
            persisted: true,
            quarantined: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["inserted"], 1);
        assert_eq!(json["load"]["status"], "loaded");
        assert_eq!(json["load"]["rows"], 3);
    }
}
