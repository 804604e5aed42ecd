//! Cluster Assigner: k-means over skill vectors.
//!
//! # Algorithm
//! 1. k-means++ seeding from a `StdRng` seeded with `seed + restart`.
//! 2. Lloyd iterations: assign every row to its nearest centroid (squared
//!    Euclidean distance, ties to the lowest index), then move each centroid
//!    to the mean of its rows. An emptied cluster is re-seeded with the row
//!    farthest from its current centroid.
//! 3. Stop when assignments no longer change, the total centroid shift is at
//!    most `tol`, or `max_iter` is reached.
//! 4. Repeat for `n_init` restarts and keep the lowest inertia
//!    (within-cluster sum of squares). Ties keep the earlier restart.
//!
//! Same seed, same `k`, same rows → same centroids and labels.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clustering::vectorizer::SkillVector;
use crate::errors::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansParams {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 5,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

/// Fitted state: K centroids in vocabulary space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroids {
    pub dimension: usize,
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squares of the winning restart.
    pub inertia: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    params: KMeansParams,
    fitted: Option<Centroids>,
}

/// Result of a single restart.
struct Run {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

impl ClusterModel {
    pub fn new(params: KMeansParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    /// Restores a fitted model from persisted centroids.
    pub fn from_centroids(params: KMeansParams, centroids: Centroids) -> Result<Self, PipelineError> {
        if centroids.centroids.len() != params.k || params.k == 0 {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model declares k={} but stores {} centroids",
                params.k,
                centroids.centroids.len()
            )));
        }
        if let Some(bad) = centroids
            .centroids
            .iter()
            .find(|c| c.len() != centroids.dimension)
        {
            return Err(PipelineError::ArtifactMismatch(format!(
                "centroid of length {} in a model of dimension {}",
                bad.len(),
                centroids.dimension
            )));
        }
        Ok(Self {
            params,
            fitted: Some(centroids),
        })
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    pub fn centroids(&self) -> Option<&Centroids> {
        self.fitted.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn dimension(&self) -> Result<usize, PipelineError> {
        Ok(self.state()?.dimension)
    }

    /// Partitions `rows` into `k` clusters and returns the per-row labels.
    pub fn fit(&mut self, rows: &[SkillVector]) -> Result<Vec<usize>, PipelineError> {
        let k = self.params.k;
        if k == 0 || k > rows.len() {
            return Err(PipelineError::InvalidClusterCount { k, rows: rows.len() });
        }
        let dimension = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dimension) {
            return Err(PipelineError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let points: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| r.iter().map(|&c| f64::from(c)).collect())
            .collect();

        let mut best: Option<Run> = None;
        for restart in 0..self.params.n_init.max(1) {
            let mut rng = StdRng::seed_from_u64(self.params.seed.wrapping_add(restart as u64));
            let run = lloyd(&points, k, self.params.max_iter, self.params.tol, &mut rng);
            debug!(
                "k-means restart {restart}: inertia {:.4} after {} iterations",
                run.inertia, run.iterations
            );
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let Some(best) = best else {
            return Err(PipelineError::EmptyTrainingSet);
        };
        info!(
            "Fitted k-means with k={k} on {} rows of dimension {dimension} (inertia {:.4})",
            rows.len(),
            best.inertia
        );
        self.fitted = Some(Centroids {
            dimension,
            centroids: best.centroids,
            inertia: best.inertia,
        });
        Ok(best.labels)
    }

    /// Index of the nearest centroid; ties go to the lowest index.
    pub fn predict(&self, vector: &[u32]) -> Result<usize, PipelineError> {
        let state = self.state()?;
        if vector.len() != state.dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: state.dimension,
                actual: vector.len(),
            });
        }
        let point: Vec<f64> = vector.iter().map(|&c| f64::from(c)).collect();
        Ok(nearest(&state.centroids, &point).0)
    }

    pub fn predict_many(&self, vectors: &[SkillVector]) -> Result<Vec<usize>, PipelineError> {
        vectors.iter().map(|v| self.predict(v)).collect()
    }

    fn state(&self) -> Result<&Centroids, PipelineError> {
        self.fitted
            .as_ref()
            .ok_or(PipelineError::NotFitted("ClusterModel"))
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Returns `(index, squared distance)` of the nearest centroid.
fn nearest(centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(c, point);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    let mut min_d2: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_d2.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = n - 1;
            for (i, d) in min_d2.iter().enumerate() {
                acc += d;
                if acc > target {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // every row coincides with a centroid already
            rng.gen_range(0..n)
        };

        let centroid = points[chosen].clone();
        for (d, p) in min_d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn lloyd(points: &[Vec<f64>], k: usize, max_iter: usize, tol: f64, rng: &mut StdRng) -> Run {
    let dimension = points[0].len();
    let mut centroids = kmeans_plus_plus(points, k, rng);
    let mut labels: Vec<usize> = vec![usize::MAX; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iter.max(1) {
        iterations += 1;

        let mut changed = false;
        let mut distances = Vec::with_capacity(points.len());
        for (label, p) in labels.iter_mut().zip(points) {
            let (idx, d) = nearest(&centroids, p);
            if *label != idx {
                *label = idx;
                changed = true;
            }
            distances.push(d);
        }
        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0; dimension]; k];
        let mut counts = vec![0usize; k];
        for (&label, p) in labels.iter().zip(points) {
            counts[label] += 1;
            for (s, x) in sums[label].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut taken = vec![false; points.len()];
        let mut shift = 0.0;
        for j in 0..k {
            let updated = if counts[j] > 0 {
                sums[j].iter().map(|s| s / counts[j] as f64).collect()
            } else {
                let far = farthest_untaken(&distances, &taken);
                taken[far] = true;
                points[far].clone()
            };
            shift += squared_distance(&centroids[j], &updated);
            centroids[j] = updated;
        }
        if shift <= tol {
            break;
        }
    }

    // Final labels and inertia always agree with the returned centroids.
    let mut inertia = 0.0;
    for (label, p) in labels.iter_mut().zip(points) {
        let (idx, d) = nearest(&centroids, p);
        *label = idx;
        inertia += d;
    }

    Run {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

fn farthest_untaken(distances: &[f64], taken: &[bool]) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &d) in distances.iter().enumerate() {
        if !taken[i] && d > best.1 {
            best = (i, d);
        }
    }
    best.0
}
