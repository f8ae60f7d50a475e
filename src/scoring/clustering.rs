// src/scoring/clustering.rs
//! Fixed-k clustering over [efficiency_loss, complaint_similarity].
//!
//! K-means is run directly over an ndarray feature matrix with a seeded RNG
//! so that two runs on the same batch produce bit-identical assignments.
//! Any degenerate input (fewer distinct points than clusters, non-finite
//! features) downgrades every record to cluster 0 with a warning; clustering
//! is an optional refinement and must never abort the run.

use log::warn;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::config::ScoringConfig;

const MAX_KMEANS_ITERATIONS: usize = 100;

/// Assigns a cluster id in `0..config.cluster_count` to every record.
pub fn cluster_records(
    efficiency_loss: &[f64],
    complaint_similarity: &[f64],
    config: &ScoringConfig,
) -> Vec<i32> {
    let n = efficiency_loss.len();
    debug_assert_eq!(n, complaint_similarity.len());
    if n == 0 {
        return Vec::new();
    }

    let k = config.cluster_count;
    if k == 0 {
        warn!("Cluster count is 0; defaulting all records to cluster 0");
        return vec![0; n];
    }

    let mut features = Array2::<f64>::zeros((n, 2));
    let mut saw_non_finite = false;
    for i in 0..n {
        let loss = efficiency_loss[i];
        let sim = complaint_similarity[i];
        features[[i, 0]] = if loss.is_finite() { loss } else { 0.0 };
        features[[i, 1]] = if sim.is_finite() { sim } else { 0.0 };
        saw_non_finite |= !loss.is_finite() || !sim.is_finite();
    }
    if saw_non_finite {
        warn!("Non-finite clustering features coerced to 0.0");
    }

    match kmeans(&features, k, config.random_seed) {
        Some(labels) => labels,
        None => {
            warn!(
                "Clustering failed (fewer than {} distinct points); defaulting cluster_id=0",
                k
            );
            vec![0; n]
        }
    }
}

/// Lloyd's algorithm with seeded initialization from distinct points.
/// Returns `None` when the input cannot support `k` clusters.
fn kmeans(features: &Array2<f64>, k: usize, seed: u64) -> Option<Vec<i32>> {
    let n = features.nrows();

    let mut distinct: Vec<[f64; 2]> = Vec::new();
    for row in features.rows() {
        let point = [row[0], row[1]];
        if !distinct.iter().any(|p| p == &point) {
            distinct.push(point);
        }
    }
    if distinct.len() < k {
        return None;
    }

    // Deterministic centroid seeding: a seeded pick for the first centroid,
    // then farthest-point selection for the rest.
    let mut rng = StdRng::seed_from_u64(seed);
    let first = rng.gen_range(0..distinct.len());
    let mut chosen: Vec<[f64; 2]> = vec![distinct[first]];
    while chosen.len() < k {
        let mut farthest = distinct[0];
        let mut farthest_distance = -1.0f64;
        for point in &distinct {
            let min_distance = chosen
                .iter()
                .map(|c| {
                    let dx = point[0] - c[0];
                    let dy = point[1] - c[1];
                    dx * dx + dy * dy
                })
                .fold(f64::INFINITY, f64::min);
            if min_distance > farthest_distance {
                farthest_distance = min_distance;
                farthest = *point;
            }
        }
        chosen.push(farthest);
    }
    let mut centroids = Array2::<f64>::zeros((k, 2));
    for (c, point) in chosen.iter().enumerate() {
        centroids[[c, 0]] = point[0];
        centroids[[c, 1]] = point[1];
    }

    let mut labels = vec![0usize; n];
    for _ in 0..MAX_KMEANS_ITERATIONS {
        // Assignment step; ties break toward the lowest cluster index.
        let mut changed = false;
        for (i, row) in features.rows().into_iter().enumerate() {
            let mut best = 0usize;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.rows().into_iter().enumerate() {
                let dx = row[0] - centroid[0];
                let dy = row[1] - centroid[1];
                let distance = dx * dx + dy * dy;
                if distance < best_distance {
                    best_distance = distance;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Update step; empty clusters keep their previous centroid.
        let mut sums = Array2::<f64>::zeros((k, 2));
        let mut counts = Array1::<f64>::zeros(k);
        for (i, row) in features.rows().into_iter().enumerate() {
            sums[[labels[i], 0]] += row[0];
            sums[[labels[i], 1]] += row[1];
            counts[labels[i]] += 1.0;
        }
        for c in 0..k {
            if counts[c] > 0.0 {
                centroids
                    .row_mut(c)
                    .assign(&(&sums.index_axis(Axis(0), c) / counts[c]));
            }
        }
    }

    Some(labels.into_iter().map(|l| l as i32).collect())
}
