// Skill clustering: tokenizer registry, count vectorizer, k-means assigner,
// versioned artifacts, and the explicit pipeline context that owns them.
// Fitting is offline; the serving path only ever transforms and predicts.

pub mod artifacts;
pub mod context;
pub mod kmeans;
pub mod tokenizer;
pub mod vectorizer;

pub use context::PipelineContext;
