//! The persisted, de-duplicated, cluster-labeled posting collection.
//!
//! Rows are keyed by `(title, company, location)`. Merging is an explicit
//! keyed upsert: a later record for an existing key replaces it in place,
//! new keys are appended. Nothing is ever deleted.

#![allow(dead_code)]

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::models::posting::{DedupKey, JobRecord, STORE_COLUMNS};
use crate::persist::write_atomic;
use crate::store::columns::{cell, ColumnMap};

/// How the store came to be in memory. `RecoveredEmpty` means prior dedup
/// history was lost and must be surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { rows: usize },
    Missing,
    RecoveredEmpty { reason: String },
}

impl LoadOutcome {
    pub fn is_recovered_empty(&self) -> bool {
        matches!(self, LoadOutcome::RecoveredEmpty { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStore {
    records: Vec<JobRecord>,
    index: HashMap<DedupKey, usize>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = JobRecord>) -> Self {
        let mut store = Self::new();
        store.merge(records);
        store
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &DedupKey) -> Option<&JobRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// Last-write-wins insert by dedup key. An overridden record keeps its position.
    pub fn upsert(&mut self, record: JobRecord) -> Upsert {
        let key = record.dedup_key();
        match self.index.get(&key) {
            Some(&i) if self.records[i] == record => Upsert::Unchanged,
            Some(&i) => {
                self.records[i] = record;
                Upsert::Updated
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    /// Applies a batch in order. Re-applying the same batch changes nothing.
    ///
    /// Rows sharing a key within the batch collapse to the last one first, so
    /// the stats count one outcome per distinct key.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = JobRecord>) -> MergeStats {
        let mut stats = MergeStats::default();
        for record in collapse_by_key(batch) {
            match self.upsert(record) {
                Upsert::Inserted => stats.inserted += 1,
                Upsert::Updated => stats.updated += 1,
                Upsert::Unchanged => stats.unchanged += 1,
            }
        }
        stats
    }

    /// Loads the store, failing closed: a missing file is a fresh empty store,
    /// an unreadable one is replaced by an empty store and reported.
    pub fn load(path: &Path) -> (Self, LoadOutcome) {
        match Self::read(path) {
            Ok(Some(store)) => {
                let rows = store.len();
                info!("Loaded {rows} jobs from {}", path.display());
                (store, LoadOutcome::Loaded { rows })
            }
            Ok(None) => {
                info!("No job store at {}; starting empty", path.display());
                (Self::new(), LoadOutcome::Missing)
            }
            Err(e) => {
                warn!("{e}; continuing with an empty store, prior dedup history is lost");
                (
                    Self::new(),
                    LoadOutcome::RecoveredEmpty {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Strict read. `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, PipelineError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unreadable(path, e)),
        };
        Self::from_reader(file)
            .map(Some)
            .map_err(|e| unreadable(path, e))
    }

    /// Parses store CSV. Columns are matched by name; `Date` may be absent
    /// in stores written before it existed and is backfilled as empty.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let columns = ColumnMap::new(rdr.headers()?);

        let title = columns.require("Title")?;
        let company = columns.require("Company")?;
        let location = columns.require("Location")?;
        let skills = columns.require("Skills")?;
        let cluster = columns.require("Cluster")?;
        let date = columns.position("Date");

        let mut store = Self::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let raw_cluster = cell(&record, Some(cluster)).trim();
            let cluster_id = raw_cluster.parse::<u32>().map_err(|_| {
                PipelineError::InvalidRow(format!(
                    "row {} has non-integer cluster '{raw_cluster}'",
                    row + 1
                ))
            })?;
            store.upsert(JobRecord {
                title: cell(&record, Some(title)).to_string(),
                company: cell(&record, Some(company)).to_string(),
                location: cell(&record, Some(location)).to_string(),
                date: cell(&record, date).to_string(),
                skills: cell(&record, Some(skills)).to_string(),
                cluster: cluster_id,
            });
        }
        Ok(store)
    }

    /// Replaces the file at `path` with the full store.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        write_atomic(path, |w| self.to_writer(w))?;
        info!("Saved {} unique jobs to {}", self.len(), path.display());
        Ok(())
    }

    /// Writes the header even when the store is empty.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), PipelineError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(STORE_COLUMNS)?;
        for r in &self.records {
            let cluster = r.cluster.to_string();
            wtr.write_record([
                r.title.as_str(),
                r.company.as_str(),
                r.location.as_str(),
                r.date.as_str(),
                r.skills.as_str(),
                cluster.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Last row per key wins; each key keeps the position of its first row.
fn collapse_by_key(batch: impl IntoIterator<Item = JobRecord>) -> Vec<JobRecord> {
    let mut rows: Vec<JobRecord> = Vec::new();
    let mut seen: HashMap<DedupKey, usize> = HashMap::new();
    for record in batch {
        match seen.entry(record.dedup_key()) {
            Entry::Occupied(slot) => rows[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(rows.len());
                rows.push(record);
            }
        }
    }
    rows
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::StoreUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, skills: &str, cluster: u32) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            company: "Y".to_string(),
            location: "Z".to_string(),
            date: String::new(),
            skills: skills.to_string(),
            cluster,
        }
    }

    #[test]
    fn test_merge_override_keeps_one_record_with_new_values() {
        let mut store = JobStore::from_records(vec![record("X", "a", 1)]);
        let stats = store.merge(vec![record("X", "b", 2)]);

        assert_eq!(stats.updated, 1);
        assert_eq!(store.len(), 1);
        let kept = store.get(&DedupKey::new("X", "Y", "Z")).unwrap();
        assert_eq!(kept.skills, "b");
        assert_eq!(kept.cluster, 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut store = JobStore::from_records(vec![record("A", "a", 0), record("B", "b", 1)]);
        let batch = vec![record("B", "bb", 2), record("C", "c", 0)];

        store.merge(batch.clone());
        let once = store.clone();
        let stats = store.merge(batch);

        assert_eq!(store, once);
        assert_eq!(stats, MergeStats { inserted: 0, updated: 0, unchanged: 2 });
    }

    #[test]
    fn test_override_keeps_position_and_new_keys_append() {
        let mut store = JobStore::from_records(vec![record("A", "a", 0), record("B", "b", 1)]);
        store.merge(vec![record("C", "c", 0), record("A", "aa", 2)]);
        let titles: Vec<&str> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(store.records()[0].skills, "aa");
    }

    #[test]
    fn test_later_row_in_same_batch_wins() {
        let store = JobStore::from_records(vec![record("A", "first", 0), record("A", "second", 1)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].skills, "second");
    }

    #[test]
    fn test_rerun_of_batch_with_repeated_key_is_unchanged() {
        let batch = vec![record("A", "first", 0), record("B", "b", 1), record("A", "second", 1)];
        let mut store = JobStore::new();

        let first = store.merge(batch.clone());
        assert_eq!(first, MergeStats { inserted: 2, updated: 0, unchanged: 0 });

        let again = store.merge(batch);
        assert_eq!(again, MergeStats { inserted: 0, updated: 0, unchanged: 2 });
        let titles: Vec<&str> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(store.records()[0].skills, "second");
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut store = JobStore::from_records(vec![record("A", "a", 0)]);
        let before = store.clone();
        assert_eq!(store.merge(Vec::new()), MergeStats::default());
        assert_eq!(store, before);
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let store = JobStore::from_records(vec![
            record("A", "python, sql", 0),
            record("B, Senior", "sales", 3),
        ]);
        store.save(&path).unwrap();

        let read = JobStore::read(&path).unwrap().unwrap();
        assert_eq!(read, store);
    }

    #[test]
    fn test_empty_store_keeps_schema() {
        let mut buf = Vec::new();
        JobStore::new().to_writer(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.trim_end(), "Title,Company,Location,Date,Skills,Cluster");

        let reread = JobStore::from_reader(text.as_bytes()).unwrap();
        assert!(reread.is_empty());
    }

    #[test]
    fn test_store_without_date_column_is_backfilled() {
        let csv = "Title,Company,Location,Skills,Cluster\nX,Y,Z,python,1\n";
        let store = JobStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.records()[0].date, "");
        assert_eq!(store.records()[0].cluster, 1);
    }

    #[test]
    fn test_missing_file_loads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (store, outcome) = JobStore::load(&dir.path().join("absent.csv"));
        assert!(store.is_empty());
        assert_eq!(outcome, LoadOutcome::Missing);
    }

    #[test]
    fn test_corrupt_file_recovers_empty_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(&path, "Title,Company,Location,Skills,Cluster\nX,Y,Z,python,not-a-number\n")
            .unwrap();

        let (store, outcome) = JobStore::load(&path);
        assert!(store.is_empty());
        assert!(outcome.is_recovered_empty());
        match outcome {
            LoadOutcome::RecoveredEmpty { reason } => assert!(reason.contains("not-a-number")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_strict_read_surfaces_store_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(&path, "garbage\n").unwrap();
        assert!(matches!(
            JobStore::read(&path),
            Err(PipelineError::StoreUnreadable { .. })
        ));
    }

    #[test]
    fn test_loaded_outcome_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        JobStore::from_records(vec![record("A", "a", 0)]).save(&path).unwrap();
        let (_, outcome) = JobStore::load(&path);
        assert_eq!(outcome, LoadOutcome::Loaded { rows: 1 });
    }
}
