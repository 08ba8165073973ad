//! Tiny k-means over scalars.
//!
//! Built for splitting sequence brightness into a handful of levels, not as a
//! general clustering tool: one dimension, percentile initialization, a fixed
//! number of rounds and no restarts.

use log::debug;

use crate::error::{PrepError, PrepResult};

pub const DEFAULT_CLUSTERS: usize = 3;
pub const DEFAULT_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarKMeans {
    pub clusters: usize,
    pub iterations: usize,
}

impl Default for ScalarKMeans {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl ScalarKMeans {
    pub fn new(clusters: usize, iterations: usize) -> Self {
        Self {
            clusters,
            iterations,
        }
    }

    /// Cluster `values` and return the centroids in ascending order.
    ///
    /// Centroids start at evenly spaced percentiles between the 10th and the
    /// 90th (10/50/90 for three clusters). If a round leaves a cluster empty,
    /// the centroids of the previous round are returned.
    pub fn fit(&self, values: &[f64]) -> PrepResult<Vec<f64>> {
        if self.clusters == 0 {
            return Err(PrepError::InvalidClusterCount);
        }
        if values.is_empty() {
            return Err(PrepError::EmptyInput);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut centroids: Vec<f64> = initial_percentiles(self.clusters)
            .into_iter()
            .map(|q| percentile(&sorted, q))
            .collect();

        for round in 0..self.iterations {
            let mut sums = vec![0.0; self.clusters];
            let mut counts = vec![0usize; self.clusters];
            for &value in values {
                let idx = nearest_centroid(value, &centroids);
                sums[idx] += value;
                counts[idx] += 1;
            }

            if counts.contains(&0) {
                debug!(
                    "Empty cluster in round {}, keeping centroids {:?}",
                    round + 1,
                    centroids
                );
                break;
            }

            centroids = sums
                .iter()
                .zip(&counts)
                .map(|(sum, &count)| sum / count as f64)
                .collect();
        }

        centroids.sort_by(f64::total_cmp);
        Ok(centroids)
    }
}

/// Percentile ranks used to seed `clusters` centroids.
pub fn initial_percentiles(clusters: usize) -> Vec<f64> {
    match clusters {
        0 => Vec::new(),
        1 => vec![50.0],
        k => (0..k)
            .map(|i| 10.0 + 80.0 * i as f64 / (k - 1) as f64)
            .collect(),
    }
}

/// `q`-th percentile of ascending `sorted`, interpolating linearly between
/// neighbouring order statistics.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let Some(&first) = sorted.first() else {
        return f64::NAN;
    };
    if sorted.len() == 1 {
        return first;
    }

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Index of the centroid closest to `value`; ties go to the lower index.
pub fn nearest_centroid(value: f64, centroids: &[f64]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let dist = (value - centroid).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
