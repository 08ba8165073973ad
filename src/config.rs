use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BATCH_PATTERN: &str = "output_batch_*";
pub const DEFAULT_ANNOTATION_FILE: &str = "annotations.json";
pub const DEFAULT_IMAGE_DIR: &str = "rgb";
pub const DEFAULT_SEED: u64 = 42;

/// Command-line arguments for building a YOLO dataset from rendered COCO batches.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Directory containing the batch folders
    #[arg(short = 'r', long = "root", default_value = ".")]
    pub root: PathBuf,

    /// Glob pattern selecting batch folders inside the root
    #[arg(long = "batch_pattern", default_value = DEFAULT_BATCH_PATTERN)]
    pub batch_pattern: String,

    /// COCO annotation file name inside each batch folder
    #[arg(long = "annotation_file", default_value = DEFAULT_ANNOTATION_FILE)]
    pub annotation_file: String,

    /// Image tree inside each batch folder
    #[arg(long = "image_dir", default_value = DEFAULT_IMAGE_DIR)]
    pub image_dir: String,

    /// Output directory of the YOLO dataset
    #[arg(short = 'o', long = "output_dir", default_value = "yolo_dataset")]
    pub output_dir: PathBuf,

    /// Probability of assigning an image to the training split
    #[arg(long = "train_ratio", default_value_t = 0.8, value_parser = validate_ratio)]
    pub train_ratio: f64,

    /// Delete the output directory before writing
    #[arg(long = "force_recreate", default_value_t = true, action = ArgAction::Set)]
    pub force_recreate: bool,

    /// Seed for the train/val assignment
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Draw the train/val assignment from OS entropy instead of the seed
    #[arg(long = "unseeded")]
    pub unseeded: bool,

    /// What to do with images that cannot be found on disk
    #[arg(long = "missing_image", value_enum, default_value = "drop")]
    pub missing_image: MissingImagePolicy,

    /// Copy images instead of symlinking them
    #[arg(long = "copy_images")]
    pub copy_images: bool,

    /// Renumber category ids to 0..N-1 after the dataset is written
    #[arg(long = "remap_categories")]
    pub remap_categories: bool,
}

impl Args {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            output_dir: self.output_dir.clone(),
            train_ratio: self.train_ratio,
            force_recreate: self.force_recreate,
            seed: if self.unseeded { None } else { Some(self.seed) },
            missing_image: self.missing_image,
            placement: if self.copy_images {
                Placement::Copy
            } else {
                Placement::Link
            },
        }
    }

    pub fn batch_layout(&self) -> BatchLayout {
        BatchLayout {
            pattern: self.batch_pattern.clone(),
            annotation_file: self.annotation_file.clone(),
            image_dir: self.image_dir.clone(),
        }
    }
}

/// Command-line arguments for recovering per-sequence brightness labels.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct BrightnessArgs {
    /// Directory containing the batch folders
    #[arg(short = 'r', long = "root", default_value = ".")]
    pub root: PathBuf,

    /// Glob pattern selecting batch folders inside the root
    #[arg(long = "batch_pattern", default_value = DEFAULT_BATCH_PATTERN)]
    pub batch_pattern: String,

    /// Image tree inside each batch folder
    #[arg(long = "image_dir", default_value = DEFAULT_IMAGE_DIR)]
    pub image_dir: String,

    /// Glob pattern selecting sequence folders inside the image tree
    #[arg(long = "sequence_pattern", default_value = "seq_*")]
    pub sequence_pattern: String,

    /// Extension of frame files
    #[arg(long = "frame_extension", default_value = "png")]
    pub frame_extension: String,

    /// Where to write the sequence to brightness map
    #[arg(short = 'o', long = "output", default_value = "scene_brightness.json")]
    pub output: PathBuf,

    /// Number of clustering rounds
    #[arg(long = "iterations", default_value_t = 10)]
    pub iterations: usize,
}

impl BrightnessArgs {
    pub fn batch_layout(&self) -> BatchLayout {
        BatchLayout {
            pattern: self.batch_pattern.clone(),
            annotation_file: DEFAULT_ANNOTATION_FILE.to_string(),
            image_dir: self.image_dir.clone(),
        }
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            sequence_pattern: self.sequence_pattern.clone(),
            frame_extension: self.frame_extension.clone(),
            iterations: self.iterations,
        }
    }
}

// How a batch folder is laid out on disk
#[derive(Debug, Clone)]
pub struct BatchLayout {
    pub pattern: String,
    pub annotation_file: String,
    pub image_dir: String,
}

impl Default for BatchLayout {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_BATCH_PATTERN.to_string(),
            annotation_file: DEFAULT_ANNOTATION_FILE.to_string(),
            image_dir: DEFAULT_IMAGE_DIR.to_string(),
        }
    }
}

/// Options driving a single dataset build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub output_dir: PathBuf,
    pub train_ratio: f64,
    pub force_recreate: bool,
    /// `None` draws the split from OS entropy.
    pub seed: Option<u64>,
    pub missing_image: MissingImagePolicy,
    pub placement: Placement,
}

impl BuildOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            train_ratio: 0.8,
            force_recreate: true,
            seed: Some(DEFAULT_SEED),
            missing_image: MissingImagePolicy::Drop,
            placement: Placement::Link,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SamplingOptions {
    pub sequence_pattern: String,
    pub frame_extension: String,
    pub iterations: usize,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            sequence_pattern: "seq_*".to_string(),
            frame_extension: "png".to_string(),
            iterations: 10,
        }
    }
}

// Handling of images listed in the annotations but absent on disk
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum MissingImagePolicy {
    /// Leave the image and its annotations out of the dataset
    Drop,
    /// Abort the run
    Fail,
    /// Write a blank image of the declared size and keep the labels
    Placeholder,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Placement {
    Link,
    Copy,
}

// Validate that the ratio lies strictly between 0.0 and 1.0
pub fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("RATIO must be strictly between 0.0 and 1.0".to_string()),
    }
}
