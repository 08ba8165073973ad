use glob::{glob, Pattern};
use image::ImageFormat;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use crate::config::{BatchLayout, BuildOptions, Placement};
use crate::error::{PrepError, PrepResult};
use crate::types::{Batch, Manifest, OutputDirs, Split};
use crate::utils::create_output_directory;

pub const MANIFEST_FILE_NAME: &str = "data.yaml";

/// Outcome of putting one image into the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Linked,
    Copied,
    AlreadyPresent,
}

// Sorted directories directly below `dir` whose name matches `pattern`
fn matching_dirs(dir: &Path, pattern: &str) -> PrepResult<Vec<PathBuf>> {
    let full_pattern = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    let entries = glob(&full_pattern).map_err(|source| PrepError::Pattern {
        pattern: full_pattern.clone(),
        source,
    })?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Find the batch folders under `root`, sorted by name.
pub fn discover_batches(root: &Path, layout: &BatchLayout) -> PrepResult<Vec<Batch>> {
    let batches: Vec<Batch> = matching_dirs(root, &layout.pattern)?
        .into_iter()
        .filter_map(|dir| {
            let name = dir.file_name()?.to_string_lossy().into_owned();
            Some(Batch {
                annotation_path: dir.join(&layout.annotation_file),
                image_root: dir.join(&layout.image_dir),
                name,
                dir,
            })
        })
        .collect();

    if batches.is_empty() {
        return Err(PrepError::NoBatchesFound {
            searched: root.join(&layout.pattern).display().to_string(),
        });
    }
    Ok(batches)
}

/// Sequence folders of a batch image tree, sorted by name.
pub fn discover_sequences(image_root: &Path, pattern: &str) -> PrepResult<Vec<PathBuf>> {
    if !image_root.is_dir() {
        return Ok(Vec::new());
    }
    matching_dirs(image_root, pattern)
}

/// The lexicographically first frame of a sequence folder.
pub fn first_frame(sequence_dir: &Path, extension: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(sequence_dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == extension)
        })
        .min_by(|a, b| a.file_name().cmp(&b.file_name()))
}

/// Set up the directory structure for the YOLO dataset output
pub fn setup_output_directories(options: &BuildOptions) -> PrepResult<OutputDirs> {
    let root = create_output_directory(&options.output_dir, options.force_recreate)?;
    let images_dir = root.join("images");
    let labels_dir = root.join("labels");

    Ok(OutputDirs {
        train_images_dir: create_output_directory(&images_dir.join(Split::Train.as_str()), false)?,
        val_images_dir: create_output_directory(&images_dir.join(Split::Val.as_str()), false)?,
        train_labels_dir: create_output_directory(&labels_dir.join(Split::Train.as_str()), false)?,
        val_labels_dir: create_output_directory(&labels_dir.join(Split::Val.as_str()), false)?,
        root,
    })
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_src: &Path, _dst: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

/// Put `src` at `dst`, by symlink when asked and possible, by copy otherwise.
/// An existing `dst` is left untouched.
pub fn place_image(src: &Path, dst: &Path, placement: Placement) -> PrepResult<PlacementOutcome> {
    if fs::symlink_metadata(dst).is_ok() {
        return Ok(PlacementOutcome::AlreadyPresent);
    }

    if placement == Placement::Link {
        // Link to the absolute path so the link survives moving the dataset root
        let target = fs::canonicalize(src).unwrap_or_else(|_| src.to_path_buf());
        match symlink_file(&target, dst) {
            Ok(()) => return Ok(PlacementOutcome::Linked),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Ok(PlacementOutcome::AlreadyPresent)
            }
            Err(e) => debug!("Cannot link {} ({}), copying instead", dst.display(), e),
        }
    }

    fs::copy(src, dst).map_err(|e| PrepError::io(dst, e))?;
    Ok(PlacementOutcome::Copied)
}

/// Largest placeholder the builder will allocate, in pixels.
pub const MAX_PLACEHOLDER_PIXELS: u64 = 1 << 26;

/// Write a black image of the given size; the format follows the extension of `dst`.
///
/// The image is encoded in memory first, so `dst` is only created once the
/// encoder has accepted it.
pub fn write_placeholder_image(dst: &Path, width: u32, height: u32) -> PrepResult<()> {
    if u64::from(width) * u64::from(height) > MAX_PLACEHOLDER_PIXELS {
        return Err(PrepError::PlaceholderTooLarge {
            path: dst.to_path_buf(),
            width,
            height,
        });
    }
    let image_error = |source: image::ImageError| PrepError::Image {
        path: dst.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(dst).map_err(image_error)?;
    let mut encoded = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut encoded, format)
        .map_err(image_error)?;
    fs::write(dst, encoded.into_inner()).map_err(|e| PrepError::io(dst, e))
}

pub fn write_label_file(path: &Path, content: &str) -> PrepResult<()> {
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| PrepError::io(path, e))
}

// Single-quoted YAML scalar
fn yaml_quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Render the dataset.yaml consumed by the trainer
pub fn render_dataset_yaml(manifest: &Manifest) -> String {
    let mut yaml_content = format!(
        "path: {} # dataset root dir\ntrain: images/train\nval: images/val\n",
        manifest.root.to_string_lossy()
    );
    yaml_content.push_str("\n# Classes\n");
    yaml_content.push_str(&format!("nc: {}\n", manifest.class_count()));

    let names: Vec<String> = manifest.categories.values().map(|n| yaml_quote(n)).collect();
    yaml_content.push_str(&format!("names: [{}]\n", names.join(", ")));

    yaml_content.push_str(&format!(
        "\n# Images: {} train, {} val\n",
        manifest.train_images, manifest.val_images
    ));
    yaml_content
}

/// Create the data.yaml file in the dataset root
pub fn create_dataset_yaml(manifest: &Manifest) -> PrepResult<PathBuf> {
    let path = manifest.root.join(MANIFEST_FILE_NAME);
    let mut dataset_yaml =
        BufWriter::new(File::create(&path).map_err(|e| PrepError::io(&path, e))?);
    dataset_yaml
        .write_all(render_dataset_yaml(manifest).as_bytes())
        .and_then(|_| dataset_yaml.flush())
        .map_err(|e| PrepError::io(&path, e))?;
    Ok(path)
}

/// Write the sequence to brightness map as 4-space indented JSON.
pub fn write_brightness_map(path: &Path, mapping: &BTreeMap<String, f64>) -> PrepResult<()> {
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    mapping
        .serialize(&mut serializer)
        .map_err(|source| PrepError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|e| PrepError::io(path, e))
}
