//! Dataset building: COCO batches in, YOLO tree and data.yaml out.

use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bbox::convert_to_yolo_format;
use crate::config::{BuildOptions, MissingImagePolicy};
use crate::error::{PrepError, PrepResult};
use crate::io::{
    create_dataset_yaml, place_image, setup_output_directories, write_label_file,
    write_placeholder_image, PlacementOutcome,
};
use crate::resolve::PathResolver;
use crate::split::DatasetSplitter;
use crate::types::{
    Batch, CocoAnnotation, CocoAnnotations, CocoImage, Manifest, OutputDirs, ProcessingStats,
};
use crate::utils::{
    create_progress_bar, flattened_file_name, label_file_name, read_coco_annotations,
};

/// Builds the YOLO dataset from a list of batches.
///
/// A builder is meant for a single [`build`](DatasetBuilder::build) call; the
/// category map and statistics accumulate across batches of that call.
pub struct DatasetBuilder {
    options: BuildOptions,
    splitter: DatasetSplitter,
    categories: BTreeMap<u32, String>,
    written_labels: HashSet<PathBuf>,
    stats: ProcessingStats,
}

impl DatasetBuilder {
    pub fn new(options: BuildOptions) -> Self {
        let splitter = DatasetSplitter::new(options.train_ratio, options.seed);
        Self {
            options,
            splitter,
            categories: BTreeMap::new(),
            written_labels: HashSet::new(),
            stats: ProcessingStats::new(),
        }
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Process every batch and write data.yaml.
    ///
    /// Batches without a readable annotation file are skipped. Nothing is
    /// written when `batches` is empty.
    pub fn build(&mut self, batches: &[Batch]) -> PrepResult<Manifest> {
        if batches.is_empty() {
            return Err(PrepError::NoBatchesFound {
                searched: "empty batch list".to_string(),
            });
        }
        self.stats.batches_found += batches.len();

        let output_dirs = setup_output_directories(&self.options)?;
        info!("Creating YOLO dataset in {}", output_dirs.root.display());

        for batch in batches {
            info!("Processing {}...", batch.name);
            let coco = match read_coco_annotations(&batch.annotation_path) {
                Ok(coco) => coco,
                Err(e @ PrepError::MissingBatchAnnotation { .. }) => {
                    warn!("{}, skipping batch {}", e, batch.name);
                    self.stats.skipped_missing_annotation += 1;
                    continue;
                }
                Err(e @ (PrepError::Json { .. } | PrepError::Io { .. })) => {
                    warn!("{}, skipping batch {}", e, batch.name);
                    self.stats.skipped_unreadable_annotation += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.process_batch(batch, &coco, &output_dirs)?;
            self.stats.batches_processed += 1;
        }

        let manifest = Manifest {
            root: fs::canonicalize(&output_dirs.root)
                .map_err(|e| PrepError::io(&output_dirs.root, e))?,
            categories: self.categories.clone(),
            train_images: self.stats.train_images,
            val_images: self.stats.val_images,
        };

        info!("Creating data.yaml...");
        let yaml_path = create_dataset_yaml(&manifest)?;
        info!("Dataset ready, descriptor at {}", yaml_path.display());
        Ok(manifest)
    }

    fn register_categories(&mut self, coco: &CocoAnnotations) {
        for category in &coco.categories {
            match self.categories.get(&category.id) {
                Some(existing) if existing != &category.name => debug!(
                    "Category {} already named '{}', ignoring '{}'",
                    category.id, existing, category.name
                ),
                Some(_) => {}
                None => {
                    self.categories.insert(category.id, category.name.clone());
                }
            }
        }
    }

    fn process_batch(
        &mut self,
        batch: &Batch,
        coco: &CocoAnnotations,
        output_dirs: &OutputDirs,
    ) -> PrepResult<()> {
        self.register_categories(coco);

        let mut image_to_annotations: HashMap<u64, Vec<&CocoAnnotation>> = coco
            .images
            .iter()
            .map(|image| (image.id, Vec::new()))
            .collect();
        for annotation in &coco.annotations {
            match image_to_annotations.get_mut(&annotation.image_id) {
                Some(list) => list.push(annotation),
                None => self.stats.orphaned_annotations += 1,
            }
        }

        let mut resolver = PathResolver::new(&batch.image_root);
        let pb = create_progress_bar(coco.images.len() as u64, "Converting");
        for image in &coco.images {
            let annotations = image_to_annotations
                .get(&image.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.process_image(batch, image, annotations, &mut resolver, output_dirs)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    fn process_image(
        &mut self,
        batch: &Batch,
        image: &CocoImage,
        annotations: &[&CocoAnnotation],
        resolver: &mut PathResolver,
        output_dirs: &OutputDirs,
    ) -> PrepResult<()> {
        self.stats.total_images += 1;

        if image.width == 0 || image.height == 0 {
            warn!(
                "Image {} of {} has zero width or height, skipping",
                image.file_name, batch.name
            );
            self.stats.skipped_invalid_size += 1;
            return Ok(());
        }

        let source = resolver.resolve(&image.file_name);
        if source.is_none() {
            match self.options.missing_image {
                MissingImagePolicy::Drop => {
                    debug!("Image {} of {} not found", image.file_name, batch.name);
                    self.stats.skipped_unresolved_image += 1;
                    return Ok(());
                }
                MissingImagePolicy::Fail => {
                    return Err(PrepError::UnresolvedImagePath {
                        batch: batch.name.clone(),
                        file_name: image.file_name.clone(),
                        image_root: resolver.image_root().to_path_buf(),
                    })
                }
                MissingImagePolicy::Placeholder => {}
            }
        }

        let split = self.splitter.assign();
        let file_name = flattened_file_name(&batch.name, &image.file_name);
        let image_dst = output_dirs.images_dir(split).join(&file_name);

        match source {
            Some(src) => match place_image(&src, &image_dst, self.options.placement)? {
                PlacementOutcome::Linked => self.stats.images_linked += 1,
                PlacementOutcome::Copied => self.stats.images_copied += 1,
                PlacementOutcome::AlreadyPresent => self.stats.images_already_present += 1,
            },
            None => {
                if !self.write_placeholder(&image_dst, image)? {
                    self.stats.skipped_unresolved_image += 1;
                    return Ok(());
                }
            }
        }

        let label_dst = output_dirs
            .labels_dir(split)
            .join(label_file_name(&batch.name, &image.file_name));
        if !self.written_labels.insert(label_dst.clone()) {
            warn!(
                "Label {} is shared by more than one image of this build",
                label_dst.display()
            );
        }
        let yolo_data = convert_to_yolo_format(annotations, image.width, image.height);
        write_label_file(&label_dst, &yolo_data)?;

        self.stats.labels_written += 1;
        self.stats.annotations_written += annotations.len();
        self.stats.record_split(split);
        Ok(())
    }

    // Returns false when the placeholder was too large or could not be encoded
    fn write_placeholder(&mut self, dst: &Path, image: &CocoImage) -> PrepResult<bool> {
        if fs::symlink_metadata(dst).is_ok() {
            self.stats.images_already_present += 1;
            return Ok(true);
        }
        match write_placeholder_image(dst, image.width, image.height) {
            Ok(()) => {
                self.stats.placeholders_written += 1;
                Ok(true)
            }
            Err(e @ (PrepError::Image { .. } | PrepError::PlaceholderTooLarge { .. })) => {
                warn!("Cannot write placeholder for {}: {}", image.file_name, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Run the whole builder and log its summary.
pub fn process_dataset(batches: &[Batch], options: &BuildOptions) -> PrepResult<Manifest> {
    let mut builder = DatasetBuilder::new(options.clone());
    let manifest = builder.build(batches)?;
    builder.stats().print_summary();
    Ok(manifest)
}
