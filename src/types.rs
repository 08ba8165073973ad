use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// A category entry of a COCO annotation file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
}

// An image entry; `file_name` is relative to the batch image tree
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

// A single object annotation, bbox as [x_min, y_min, width, height] in pixels
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CocoAnnotation {
    pub image_id: u64,
    pub category_id: u32,
    pub bbox: [f64; 4],
}

/// The subset of a COCO annotation file the builder consumes.
/// Fields it does not know about (info, licenses, segmentation, ...) are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CocoAnnotations {
    #[serde(default)]
    pub categories: Vec<CocoCategory>,
    #[serde(default)]
    pub images: Vec<CocoImage>,
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
}

/// One rendering run: a folder holding an annotation file and an image tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub name: String,
    pub dir: PathBuf,
    pub annotation_path: PathBuf,
    pub image_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Paths of the split directories of the output tree
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
    pub train_labels_dir: PathBuf,
    pub val_labels_dir: PathBuf,
}

impl OutputDirs {
    pub fn images_dir(&self, split: Split) -> &PathBuf {
        match split {
            Split::Train => &self.train_images_dir,
            Split::Val => &self.val_images_dir,
        }
    }

    pub fn labels_dir(&self, split: Split) -> &PathBuf {
        match split {
            Split::Train => &self.train_labels_dir,
            Split::Val => &self.val_labels_dir,
        }
    }
}

/// Dataset descriptor handed to the trainer.
///
/// `categories` is keyed by the raw category id, so iterating it yields the
/// class order the trainer sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub root: PathBuf,
    pub categories: BTreeMap<u32, String>,
    pub train_images: usize,
    pub val_images: usize,
}

impl Manifest {
    pub fn class_count(&self) -> usize {
        self.categories.len()
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.categories.values().map(String::as_str).collect()
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub batches_found: usize,
    pub batches_processed: usize,
    pub skipped_missing_annotation: usize,
    pub skipped_unreadable_annotation: usize,
    pub total_images: usize,
    pub skipped_unresolved_image: usize,
    pub skipped_invalid_size: usize,
    pub placeholders_written: usize,
    pub images_linked: usize,
    pub images_copied: usize,
    pub images_already_present: usize,
    pub labels_written: usize,
    pub annotations_written: usize,
    pub orphaned_annotations: usize,
    pub train_images: usize,
    pub val_images: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_split(&mut self, split: Split) {
        match split {
            Split::Train => self.train_images += 1,
            Split::Val => self.val_images += 1,
        }
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!(
            "Batches processed: {} of {}",
            self.batches_processed,
            self.batches_found
        );
        log::info!("Images declared: {}", self.total_images);
        log::info!(
            "Images written: {} (train: {}, val: {})",
            self.train_images + self.val_images,
            self.train_images,
            self.val_images
        );
        log::info!(
            "Placement: {} linked, {} copied, {} already present",
            self.images_linked,
            self.images_copied,
            self.images_already_present
        );
        log::info!(
            "Label files: {} ({} annotations)",
            self.labels_written,
            self.annotations_written
        );

        let skipped_batches = self.skipped_missing_annotation + self.skipped_unreadable_annotation;
        if skipped_batches > 0 {
            log::warn!(
                "Skipped batches: {} (missing annotation file: {}, unreadable: {})",
                skipped_batches,
                self.skipped_missing_annotation,
                self.skipped_unreadable_annotation
            );
        }
        if self.skipped_unresolved_image > 0 || self.skipped_invalid_size > 0 {
            log::info!(
                "Skipped images: {} not found on disk, {} with zero width or height",
                self.skipped_unresolved_image,
                self.skipped_invalid_size
            );
        }
        if self.placeholders_written > 0 {
            log::warn!(
                "Blank placeholders written for {} missing images",
                self.placeholders_written
            );
        }
        if self.orphaned_annotations > 0 {
            log::warn!(
                "Ignored {} annotations referring to undeclared image ids",
                self.orphaned_annotations
            );
        }
    }
}
