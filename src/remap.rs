//! Optional renumbering of category ids to the contiguous range 0..N-1.
//!
//! The builder keeps raw COCO ids in label files. Trainers that index classes
//! by label id need them dense and zero-based; this stage rewrites an already
//! built dataset in place. It never runs unless asked for.

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{PrepError, PrepResult};
use crate::io::{create_dataset_yaml, write_label_file};
use crate::types::{Manifest, Split};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRemap {
    mapping: BTreeMap<u32, u32>,
}

impl CategoryRemap {
    /// Map ids in ascending order onto 0, 1, 2, ...
    pub fn contiguous(categories: &BTreeMap<u32, String>) -> Self {
        let mapping = categories
            .keys()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id as u32))
            .collect();
        Self { mapping }
    }

    pub fn get(&self, id: u32) -> Option<u32> {
        self.mapping.get(&id).copied()
    }

    pub fn is_identity(&self) -> bool {
        self.mapping.iter().all(|(old, new)| old == new)
    }

    /// Rewrite the class id of a label line. `None` for lines whose id is not
    /// part of the mapping or cannot be parsed.
    pub fn remap_line(&self, line: &str) -> Option<String> {
        let (id, rest) = line.split_once(' ')?;
        let new_id = self.get(id.parse().ok()?)?;
        Some(format!("{} {}", new_id, rest))
    }

    /// Rewrite one label file in place, returning how many lines were dropped.
    pub fn apply_to_label_file(&self, path: &Path) -> PrepResult<usize> {
        let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let mut remapped = String::with_capacity(content.len());
        let mut dropped = 0;
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match self.remap_line(line) {
                Some(new_line) => {
                    remapped.push_str(&new_line);
                    remapped.push('\n');
                }
                None => dropped += 1,
            }
        }
        write_label_file(path, &remapped)?;
        Ok(dropped)
    }

    pub fn apply_to_manifest(&self, manifest: &Manifest) -> Manifest {
        let categories = manifest
            .categories
            .iter()
            .filter_map(|(id, name)| self.get(*id).map(|new_id| (new_id, name.clone())))
            .collect();
        Manifest {
            categories,
            ..manifest.clone()
        }
    }
}

/// Renumber the label files and data.yaml of a built dataset.
///
/// Label files are rewritten even when the ids are already 0..N-1, so lines
/// with undeclared ids are dropped either way.
pub fn remap_dataset(manifest: &Manifest) -> PrepResult<Manifest> {
    let remap = CategoryRemap::contiguous(&manifest.categories);
    if remap.is_identity() {
        info!("Category ids are already 0..{}", manifest.class_count());
    }

    let mut files = 0;
    let mut dropped = 0;
    for split in Split::ALL {
        let labels_dir = manifest.root.join("labels").join(split.as_str());
        let entries = fs::read_dir(&labels_dir).map_err(|e| PrepError::io(&labels_dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| PrepError::io(&labels_dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "txt") {
                dropped += remap.apply_to_label_file(&path)?;
                files += 1;
            }
        }
    }
    if dropped > 0 {
        warn!(
            "Dropped {} label lines whose category id is not declared in any batch",
            dropped
        );
    }

    let remapped = remap.apply_to_manifest(manifest);
    create_dataset_yaml(&remapped)?;
    info!("Remapped category ids in {} label files", files);
    Ok(remapped)
}
