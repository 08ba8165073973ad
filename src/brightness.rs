//! Recover the lighting level each sequence was rendered with.
//!
//! The renders come in three lighting setups but the level was not recorded.
//! Each sequence is reduced to the mean luma of its first frame, the values
//! are clustered into three groups and each group gets a level by rank.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::SamplingOptions;
use crate::error::{PrepError, PrepResult};
use crate::io::{discover_sequences, first_frame};
use crate::kmeans::{nearest_centroid, ScalarKMeans};
use crate::types::Batch;
use crate::utils::{create_progress_bar, mean_luma};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BrightnessLevel {
    Low,
    Mid,
    High,
}

impl BrightnessLevel {
    /// Levels in ascending order, matching sorted centroids by position.
    pub const ALL: [BrightnessLevel; 3] = [
        BrightnessLevel::Low,
        BrightnessLevel::Mid,
        BrightnessLevel::High,
    ];

    /// Light intensity the renderer used for this level.
    pub fn value(self) -> f64 {
        match self {
            BrightnessLevel::Low => 0.1,
            BrightnessLevel::Mid => 0.5,
            BrightnessLevel::High => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BrightnessLevel::Low => "low",
            BrightnessLevel::Mid => "mid",
            BrightnessLevel::High => "high",
        }
    }
}

impl fmt::Display for BrightnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.value())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessSample {
    pub batch: String,
    pub sequence: String,
    /// Mean luma of the first frame, 0..=255.
    pub value: f64,
}

impl BrightnessSample {
    pub fn key(&self) -> String {
        format!("{}/{}", self.batch, self.sequence)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessReport {
    /// Ascending, one per level.
    pub centroids: Vec<f64>,
    pub labels: BTreeMap<String, BrightnessLevel>,
    pub counts: BTreeMap<BrightnessLevel, usize>,
}

impl BrightnessReport {
    pub fn count(&self, level: BrightnessLevel) -> usize {
        self.counts.get(&level).copied().unwrap_or(0)
    }

    /// The map as persisted: sequence key to light intensity.
    pub fn value_map(&self) -> BTreeMap<String, f64> {
        self.labels
            .iter()
            .map(|(key, level)| (key.clone(), level.value()))
            .collect()
    }

    pub fn print_summary(&self) {
        info!("Centroids (0-255): {:?}", self.centroids);
        info!("=== Recovered distribution ===");
        for level in BrightnessLevel::ALL {
            info!("{}: {}", level, self.count(level));
        }
    }
}

/// Mean luma of a single frame.
pub fn frame_brightness(frame: &Path) -> PrepResult<f64> {
    let img = image::open(frame)
        .map_err(|source| PrepError::Image {
            path: frame.to_path_buf(),
            source,
        })?
        .to_rgb8();
    mean_luma(&img).ok_or_else(|| PrepError::EmptyFrame {
        path: frame.to_path_buf(),
    })
}

/// Sample the first frame of every sequence of every batch.
///
/// Sequences without frames or with an undecodable first frame are left out.
/// The result keeps batch and sequence order.
pub fn collect_samples(
    batches: &[Batch],
    options: &SamplingOptions,
) -> PrepResult<Vec<BrightnessSample>> {
    let mut candidates: Vec<(String, String, PathBuf)> = Vec::new();
    for batch in batches {
        for sequence_dir in discover_sequences(&batch.image_root, &options.sequence_pattern)? {
            let Some(sequence) = sequence_dir.file_name() else {
                continue;
            };
            let sequence = sequence.to_string_lossy().into_owned();
            match first_frame(&sequence_dir, &options.frame_extension) {
                Some(frame) => candidates.push((batch.name.clone(), sequence, frame)),
                None => debug!("{}/{} has no frames, skipping", batch.name, sequence),
            }
        }
    }

    let pb = create_progress_bar(candidates.len() as u64, "Sampling");
    let samples: Vec<BrightnessSample> = candidates
        .into_par_iter()
        .filter_map(|(batch, sequence, frame)| {
            let sample = match frame_brightness(&frame) {
                Ok(value) => Some(BrightnessSample {
                    batch,
                    sequence,
                    value,
                }),
                Err(e) => {
                    warn!("{}, skipping sequence", e);
                    None
                }
            };
            pb.inc(1);
            sample
        })
        .collect();
    pb.finish_and_clear();

    Ok(samples)
}

/// Cluster the samples and label each sequence by its nearest centroid.
pub fn label_samples(
    samples: &[BrightnessSample],
    iterations: usize,
) -> PrepResult<BrightnessReport> {
    if samples.is_empty() {
        return Err(PrepError::NoSequencesFound);
    }

    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let centroids = ScalarKMeans::new(BrightnessLevel::ALL.len(), iterations).fit(&values)?;

    let mut labels = BTreeMap::new();
    let mut counts: BTreeMap<BrightnessLevel, usize> =
        BrightnessLevel::ALL.iter().map(|&level| (level, 0)).collect();
    for sample in samples {
        let level = BrightnessLevel::ALL[nearest_centroid(sample.value, &centroids)];
        labels.insert(sample.key(), level);
        *counts.entry(level).or_insert(0) += 1;
    }

    Ok(BrightnessReport {
        centroids,
        labels,
        counts,
    })
}

/// Full brightness pipeline over the given batches.
pub fn classify(batches: &[Batch], options: &SamplingOptions) -> PrepResult<BrightnessReport> {
    let samples = collect_samples(batches, options)?;
    info!("Sampled {} sequences.", samples.len());
    label_samples(&samples, options.iterations)
}
