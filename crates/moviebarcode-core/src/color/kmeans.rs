//! K-means clustering over color points.
//!
//! Centers start uniformly at random inside the bounding box of the data and
//! are refined with Lloyd iterations until no center moves more than
//! `epsilon` or `max_iterations` is reached. Several attempts run with
//! consecutive seeds; the most compact one wins. Attempts are independent,
//! so the result for a given seed does not depend on thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::consts::{
    DEFAULT_KMEANS_ATTEMPTS, DEFAULT_KMEANS_CLUSTERS, DEFAULT_KMEANS_EPSILON,
    DEFAULT_KMEANS_MAX_ITERATIONS, DEFAULT_KMEANS_SEED, PARALLEL_PIXEL_THRESHOLD,
};
use crate::error::{BarcodeError, Result};

/// One pixel color as three channel values.
pub type ColorPoint = [f32; 3];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    /// Number of clusters.
    pub clusters: usize,
    /// Iteration cap per attempt.
    pub max_iterations: usize,
    /// Convergence threshold on center movement, in channel units.
    pub epsilon: f32,
    /// Independent attempts with different initial centers.
    pub attempts: usize,
    /// Seed of the first attempt.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_KMEANS_CLUSTERS,
            max_iterations: DEFAULT_KMEANS_MAX_ITERATIONS,
            epsilon: DEFAULT_KMEANS_EPSILON,
            attempts: DEFAULT_KMEANS_ATTEMPTS,
            seed: DEFAULT_KMEANS_SEED,
        }
    }
}

impl KMeansParams {
    pub fn validate(&self) -> Result<()> {
        if self.clusters == 0 || self.attempts == 0 || self.max_iterations == 0 {
            return Err(BarcodeError::Config(format!(
                "k-means needs at least one cluster, attempt and iteration (got {}, {}, {})",
                self.clusters, self.attempts, self.max_iterations
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(BarcodeError::Config(format!(
                "k-means epsilon must be a non-negative number (got {})",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Result of the winning attempt.
#[derive(Clone, Debug)]
pub struct ColorClusters {
    pub centers: Vec<ColorPoint>,
    /// Number of points assigned to each center.
    pub counts: Vec<usize>,
    /// Sum of squared distances from each point to its center.
    pub compactness: f64,
}

impl ColorClusters {
    /// Index of the most populated cluster (lowest index on ties).
    pub fn dominant_index(&self) -> usize {
        let mut best = 0;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = i;
            }
        }
        best
    }

    /// Center of the most populated cluster.
    pub fn dominant(&self) -> ColorPoint {
        self.centers[self.dominant_index()]
    }
}

/// Cluster `points` into `params.clusters` groups.
///
/// Fewer points than clusters reduces the cluster count to the number of
/// points. No points at all is a decode error: there is nothing to summarize.
pub fn cluster_colors(points: &[ColorPoint], params: &KMeansParams) -> Result<ColorClusters> {
    params.validate()?;
    if points.is_empty() {
        return Err(BarcodeError::Decode("no pixels left to cluster".into()));
    }

    let k = params.clusters.min(points.len());
    let bounds = bounding_box(points);
    let run = |attempt: usize| {
        let seed = params.seed.wrapping_add(attempt as u64);
        run_attempt(points, k, &bounds, params, seed)
    };

    let attempts: Vec<ColorClusters> =
        if points.len() * params.attempts >= PARALLEL_PIXEL_THRESHOLD {
            (0..params.attempts).into_par_iter().map(run).collect()
        } else {
            (0..params.attempts).map(run).collect()
        };

    // Ties keep the earliest attempt.
    let best = attempts
        .into_iter()
        .reduce(|best, next| {
            if next.compactness < best.compactness {
                next
            } else {
                best
            }
        })
        .ok_or_else(|| BarcodeError::Config("k-means ran no attempts".into()))?;

    Ok(best)
}

fn run_attempt(
    points: &[ColorPoint],
    k: usize,
    bounds: &(ColorPoint, ColorPoint),
    params: &KMeansParams,
    seed: u64,
) -> ColorClusters {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers: Vec<ColorPoint> = (0..k).map(|_| random_center(&mut rng, bounds)).collect();
    let mut labels = vec![0usize; points.len()];
    let epsilon_sq = params.epsilon * params.epsilon;

    for iteration in 0..params.max_iterations {
        assign(points, &centers, &mut labels);
        let mut counts = label_counts(&labels, k);
        fill_empty_clusters(points, &centers, &mut labels, &mut counts);

        let updated = cluster_means(points, &labels, &centers);
        let shift = centers
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_distance(old, new))
            .fold(0.0f32, f32::max);
        centers = updated;

        if shift <= epsilon_sq {
            trace!(seed, iteration, "k-means converged");
            break;
        }
    }

    let compactness = assign(points, &centers, &mut labels);
    let counts = label_counts(&labels, k);
    ColorClusters {
        centers,
        counts,
        compactness,
    }
}

/// Per-channel `(min, max)` of the data.
fn bounding_box(points: &[ColorPoint]) -> (ColorPoint, ColorPoint) {
    let mut lo = [f32::INFINITY; 3];
    let mut hi = [f32::NEG_INFINITY; 3];
    for p in points {
        for c in 0..3 {
            lo[c] = lo[c].min(p[c]);
            hi[c] = hi[c].max(p[c]);
        }
    }
    (lo, hi)
}

fn random_center(rng: &mut StdRng, (lo, hi): &(ColorPoint, ColorPoint)) -> ColorPoint {
    let mut center = [0.0f32; 3];
    for c in 0..3 {
        center[c] = if lo[c] < hi[c] {
            rng.gen_range(lo[c]..=hi[c])
        } else {
            lo[c]
        };
    }
    center
}

fn squared_distance(a: &ColorPoint, b: &ColorPoint) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Label every point with its nearest center; returns the total squared distance.
fn assign(points: &[ColorPoint], centers: &[ColorPoint], labels: &mut [usize]) -> f64 {
    let mut total = 0.0f64;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, center) in centers.iter().enumerate() {
            let d = squared_distance(point, center);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        *label = best;
        total += best_dist as f64;
    }
    total
}

fn label_counts(labels: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0usize; k];
    for &label in labels {
        counts[label] += 1;
    }
    counts
}

/// Give each empty cluster the point farthest from the center of the
/// currently largest cluster.
fn fill_empty_clusters(
    points: &[ColorPoint],
    centers: &[ColorPoint],
    labels: &mut [usize],
    counts: &mut [usize],
) {
    for empty in 0..counts.len() {
        if counts[empty] > 0 {
            continue;
        }
        let largest = (0..counts.len())
            .max_by_key(|&i| (counts[i], std::cmp::Reverse(i)))
            .unwrap_or(0);
        if counts[largest] < 2 {
            return;
        }

        let mut far_index = None;
        let mut far_dist = -1.0f32;
        for (i, point) in points.iter().enumerate() {
            if labels[i] == largest {
                let d = squared_distance(point, &centers[largest]);
                if d > far_dist {
                    far_dist = d;
                    far_index = Some(i);
                }
            }
        }

        if let Some(i) = far_index {
            labels[i] = empty;
            counts[largest] -= 1;
            counts[empty] = 1;
        }
    }
}

/// Mean of each cluster's points. A cluster with no points keeps its old center.
fn cluster_means(points: &[ColorPoint], labels: &[usize], previous: &[ColorPoint]) -> Vec<ColorPoint> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in points.iter().zip(labels) {
        for c in 0..3 {
            sums[label][c] += point[c] as f64;
        }
        counts[label] += 1;
    }

    (0..k)
        .map(|i| {
            if counts[i] == 0 {
                previous[i]
            } else {
                let n = counts[i] as f64;
                [
                    (sums[i][0] / n) as f32,
                    (sums[i][1] / n) as f32,
                    (sums[i][2] / n) as f32,
                ]
            }
        })
        .collect()
}
