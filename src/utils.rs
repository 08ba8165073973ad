use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PrepError, PrepResult};
use crate::types::CocoAnnotations;

/// Read a COCO annotation file, parsing straight from the file stream.
pub fn read_coco_annotations(path: &Path) -> PrepResult<CocoAnnotations> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PrepError::MissingBatchAnnotation {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(PrepError::io(path, e)),
    };

    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| PrepError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory, deleting it first when `recreate` is set.
pub fn create_output_directory(path: &Path, recreate: bool) -> PrepResult<PathBuf> {
    if recreate && path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).map_err(|e| PrepError::io(path, e))?;
    }
    fs::create_dir_all(path).map_err(|e| PrepError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Destination file name for an image: batch name plus the declared path with
/// separators flattened, e.g. `output_batch_0_seq_1_frame_00002.png`.
pub fn flattened_file_name(batch_name: &str, declared: &str) -> String {
    format!("{}_{}", batch_name, declared.replace(['/', '\\'], "_"))
}

/// Label file name for an image: the flattened name with only the declared
/// file's own extension swapped for `.txt`.
pub fn label_file_name(batch_name: &str, declared: &str) -> String {
    let name_start = declared.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let stem = match declared[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &declared[..name_start + dot],
        _ => declared,
    };
    format!("{}.txt", flattened_file_name(batch_name, stem))
}

/// Mean ITU-R BT.601 luma of an RGB image on the 0..=255 scale.
///
/// Each pixel is quantized to u8 before averaging, like an 8-bit grayscale
/// conversion would do. Returns `None` for an image without pixels.
pub fn mean_luma(img: &RgbImage) -> Option<f64> {
    let pixel_count = img.width() as u64 * img.height() as u64;
    if pixel_count == 0 {
        return None;
    }
    let sum: u64 = img
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u64
        })
        .sum();
    Some(sum as f64 / pixel_count as f64)
}
