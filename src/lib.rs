//! Synthetic render batches to YOLO dataset converter
//!
//! This library turns folders of rendered frame sequences with COCO
//! annotations into a YOLO detection dataset, and recovers the lighting level
//! of each sequence by clustering frame brightness.

pub mod bbox;
pub mod brightness;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod kmeans;
pub mod remap;
pub mod resolve;
pub mod split;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use brightness::{classify, BrightnessLevel, BrightnessReport};
pub use config::{Args, BrightnessArgs, BuildOptions, MissingImagePolicy, Placement};
pub use dataset::{process_dataset, DatasetBuilder};
pub use error::{PrepError, PrepResult};
pub use io::{discover_batches, write_brightness_map};
pub use kmeans::ScalarKMeans;
pub use remap::{remap_dataset, CategoryRemap};
pub use resolve::PathResolver;
pub use split::DatasetSplitter;
pub use types::{Batch, Manifest, ProcessingStats, Split};
