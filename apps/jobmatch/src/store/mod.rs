// Job Store: CSV batch ingest, the persisted de-duplicated store, and the
// merge cycle that folds a freshly scraped batch into it.
// Single writer per store file is assumed; nothing here takes a file lock.

pub mod batch;
pub mod columns;
pub mod cycle;
pub mod job_store;

pub use cycle::{run_merge_cycle, MergeReport};
pub use job_store::{JobStore, LoadOutcome};
