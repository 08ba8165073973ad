use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use synth2yolo::config::BatchLayout;
use synth2yolo::io::{place_image, PlacementOutcome, MANIFEST_FILE_NAME};
use synth2yolo::{
    discover_batches, remap_dataset, Batch, BuildOptions, DatasetBuilder, MissingImagePolicy,
    PathResolver, Placement, PrepError, Split,
};

const FAKE_PNG: &[u8] = b"\x89PNG not really an image";

fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn make_batch(root: &Path, name: &str, coco: serde_json::Value, frames: &[&str]) -> PathBuf {
    let dir = root.join(name);
    write_file(
        &dir.join("annotations.json"),
        serde_json::to_string_pretty(&coco).unwrap().as_bytes(),
    );
    for frame in frames {
        write_file(&dir.join("rgb").join(frame), FAKE_PNG);
    }
    dir
}

fn batches(root: &Path) -> Vec<Batch> {
    discover_batches(root, &BatchLayout::default()).unwrap()
}

fn options(output: &Path) -> BuildOptions {
    BuildOptions {
        train_ratio: 0.5,
        ..BuildOptions::new(output)
    }
}

// Output file with the given name in either split
fn find_output(output: &Path, kind: &str, file_name: &str) -> Option<PathBuf> {
    Split::ALL
        .iter()
        .map(|split| output.join(kind).join(split.as_str()).join(file_name))
        .find(|path| fs::symlink_metadata(path).is_ok())
}

fn list_files(output: &Path, kind: &str) -> Vec<String> {
    let mut names: Vec<String> = Split::ALL
        .iter()
        .flat_map(|split| fs::read_dir(output.join(kind).join(split.as_str())).unwrap())
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn single_image_coco(category_id: u32, bbox: [f64; 4]) -> serde_json::Value {
    json!({
        "categories": [{"id": category_id, "name": "thing"}],
        "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 100, "height": 100}],
        "annotations": [{"image_id": 1, "category_id": category_id, "bbox": bbox}]
    })
}

#[test]
fn test_label_file_content() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        single_image_coco(3, [10.0, 10.0, 20.0, 20.0]),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    DatasetBuilder::new(options(&output))
        .build(&batches(root))
        .unwrap();

    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt")
        .expect("label file missing");
    assert_eq!(
        fs::read_to_string(label).unwrap(),
        "3 0.200000 0.200000 0.200000 0.200000\n"
    );
    assert!(find_output(&output, "images", "output_batch_0_seq_0_frame_00000.png").is_some());
}

#[test]
fn test_resolved_images_produce_one_image_and_one_label() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 1, "name": "car"}],
            "images": [
                {"id": 10, "file_name": "seq_0/frame_00000.png", "width": 64, "height": 64},
                {"id": 11, "file_name": "frame_00005.png", "width": 64, "height": 64},
                {"id": 12, "file_name": "seq_9/frame_00042.png", "width": 64, "height": 64}
            ],
            "annotations": [
                {"image_id": 10, "category_id": 1, "bbox": [0.0, 0.0, 32.0, 32.0]},
                {"image_id": 10, "category_id": 1, "bbox": [32.0, 32.0, 32.0, 32.0]},
                {"image_id": 12, "category_id": 1, "bbox": [0.0, 0.0, 8.0, 8.0]}
            ]
        }),
        &["seq_0/frame_00000.png", "seq_1/frame_00005.png"],
    );
    let output = root.join("yolo_dataset");

    let mut builder = DatasetBuilder::new(options(&output));
    let manifest = builder.build(&batches(root)).unwrap();

    assert_eq!(
        list_files(&output, "images"),
        vec![
            "output_batch_0_frame_00005.png",
            "output_batch_0_seq_0_frame_00000.png"
        ]
    );
    assert_eq!(
        list_files(&output, "labels"),
        vec![
            "output_batch_0_frame_00005.txt",
            "output_batch_0_seq_0_frame_00000.txt"
        ]
    );

    // Image without annotations still gets an (empty) label file
    let bare = find_output(&output, "labels", "output_batch_0_frame_00005.txt").unwrap();
    assert_eq!(fs::read_to_string(bare).unwrap(), "");
    let full = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    assert_eq!(fs::read_to_string(full).unwrap().lines().count(), 2);

    let stats = builder.stats();
    assert_eq!(stats.total_images, 3);
    assert_eq!(stats.skipped_unresolved_image, 1);
    assert_eq!(stats.labels_written, 2);
    assert_eq!(stats.annotations_written, 2);
    assert_eq!(manifest.train_images + manifest.val_images, 2);
}

#[cfg(unix)]
#[test]
fn test_images_are_linked_to_sources() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        single_image_coco(0, [1.0, 1.0, 2.0, 2.0]),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let mut builder = DatasetBuilder::new(options(&output));
    builder.build(&batches(root)).unwrap();

    let image = find_output(&output, "images", "output_batch_0_seq_0_frame_00000.png").unwrap();
    assert!(fs::symlink_metadata(&image).unwrap().file_type().is_symlink());
    assert!(fs::read_link(&image).unwrap().is_absolute());
    assert_eq!(fs::read(&image).unwrap(), FAKE_PNG);
    assert_eq!(builder.stats().images_linked, 1);
}

#[test]
fn test_copy_placement_and_existing_destination() {
    let temp_dir = tempfile::tempdir().unwrap();
    let src = temp_dir.path().join("frame.png");
    let dst = temp_dir.path().join("copy.png");
    fs::write(&src, FAKE_PNG).unwrap();

    assert_eq!(
        place_image(&src, &dst, Placement::Copy).unwrap(),
        PlacementOutcome::Copied
    );
    assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
    assert_eq!(fs::read(&dst).unwrap(), FAKE_PNG);

    assert_eq!(
        place_image(&src, &dst, Placement::Link).unwrap(),
        PlacementOutcome::AlreadyPresent
    );
    assert_eq!(
        place_image(&src, &dst, Placement::Copy).unwrap(),
        PlacementOutcome::AlreadyPresent
    );
}

#[test]
fn test_path_resolver_layouts() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image_root = temp_dir.path().join("rgb");
    write_file(&image_root.join("seq_0/frame_00001.png"), FAKE_PNG);
    write_file(&image_root.join("seq_1/frame_00002.png"), FAKE_PNG);
    write_file(&image_root.join("seq_2/frame_00002.png"), FAKE_PNG);

    let mut resolver = PathResolver::new(&image_root);
    assert_eq!(
        resolver.resolve("seq_0/frame_00001.png"),
        Some(image_root.join("seq_0/frame_00001.png"))
    );
    assert_eq!(
        resolver.resolve("frame_00001.png"),
        Some(image_root.join("seq_0/frame_00001.png"))
    );
    // Sorted walk: seq_1 comes before seq_2
    assert_eq!(
        resolver.resolve("frame_00002.png"),
        Some(image_root.join("seq_1/frame_00002.png"))
    );
    // Wrong sequence folder falls back to the file name search
    assert_eq!(
        resolver.resolve("seq_7/frame_00001.png"),
        Some(image_root.join("seq_0/frame_00001.png"))
    );
    assert_eq!(resolver.resolve("frame_99999.png"), None);

    let mut missing_root = PathResolver::new(temp_dir.path().join("nope"));
    assert_eq!(missing_root.resolve("frame_00001.png"), None);
}

#[test]
fn test_category_order_does_not_depend_on_batch_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({"categories": [{"id": 7, "name": "dog"}], "images": [], "annotations": []}),
        &[],
    );
    make_batch(
        root,
        "output_batch_1",
        json!({"categories": [{"id": 2, "name": "cat"}, {"id": 4, "name": "bird"}], "images": [], "annotations": []}),
        &[],
    );

    let forward = batches(root);
    let mut backward = forward.clone();
    backward.reverse();

    let first = DatasetBuilder::new(options(&root.join("out_a")))
        .build(&forward)
        .unwrap();
    let second = DatasetBuilder::new(options(&root.join("out_b")))
        .build(&backward)
        .unwrap();

    assert_eq!(first.class_names(), vec!["cat", "bird", "dog"]);
    assert_eq!(first.class_names(), second.class_names());
    assert_eq!(
        first.categories.keys().collect::<Vec<_>>(),
        second.categories.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_first_category_name_wins() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({"categories": [{"id": 1, "name": "car"}], "images": [], "annotations": []}),
        &[],
    );
    make_batch(
        root,
        "output_batch_1",
        json!({"categories": [{"id": 1, "name": "truck"}], "images": [], "annotations": []}),
        &[],
    );

    let manifest = DatasetBuilder::new(options(&root.join("out")))
        .build(&batches(root))
        .unwrap();
    assert_eq!(manifest.class_names(), vec!["car"]);
}

#[test]
fn test_category_gaps_are_kept_verbatim() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 7, "name": "dog"}, {"id": 2, "name": "cat"}],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 10, "height": 10}],
            "annotations": [
                {"image_id": 1, "category_id": 7, "bbox": [0.0, 0.0, 5.0, 5.0]},
                {"image_id": 1, "category_id": 2, "bbox": [5.0, 5.0, 5.0, 5.0]}
            ]
        }),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let manifest = DatasetBuilder::new(options(&output))
        .build(&batches(root))
        .unwrap();

    assert_eq!(manifest.categories.keys().copied().collect::<Vec<_>>(), vec![2, 7]);
    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    let content = fs::read_to_string(label).unwrap();
    let ids: Vec<&str> = content
        .lines()
        .map(|line| line.split(' ').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["7", "2"]);

    let yaml_content = fs::read_to_string(output.join(MANIFEST_FILE_NAME)).unwrap();
    assert!(yaml_content.contains("nc: 2\n"));
    assert!(yaml_content.contains("names: ['cat', 'dog']\n"));
    let canonical = fs::canonicalize(&output).unwrap();
    assert!(yaml_content.contains(&format!("path: {}", canonical.display())));
}

#[test]
fn test_remap_stage_renumbers_labels_and_manifest() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 2, "name": "cat"}, {"id": 7, "name": "dog"}],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 10, "height": 10}],
            "annotations": [
                {"image_id": 1, "category_id": 7, "bbox": [0.0, 0.0, 5.0, 5.0]},
                {"image_id": 1, "category_id": 2, "bbox": [5.0, 5.0, 5.0, 5.0]}
            ]
        }),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let manifest = DatasetBuilder::new(options(&output))
        .build(&batches(root))
        .unwrap();
    let remapped = remap_dataset(&manifest).unwrap();

    assert_eq!(remapped.categories.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(remapped.class_names(), vec!["cat", "dog"]);
    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    assert_eq!(
        fs::read_to_string(label).unwrap(),
        "1 0.250000 0.250000 0.500000 0.500000\n0 0.750000 0.750000 0.500000 0.500000\n"
    );
}

#[test]
fn test_remap_stage_drops_undeclared_ids_when_already_contiguous() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 0, "name": "cat"}, {"id": 1, "name": "dog"}],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 10, "height": 10}],
            "annotations": [
                {"image_id": 1, "category_id": 1, "bbox": [0.0, 0.0, 5.0, 5.0]},
                {"image_id": 1, "category_id": 9, "bbox": [0.0, 0.0, 1.0, 1.0]}
            ]
        }),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let manifest = DatasetBuilder::new(options(&output))
        .build(&batches(root))
        .unwrap();
    let remapped = remap_dataset(&manifest).unwrap();

    assert_eq!(remapped.class_names(), vec!["cat", "dog"]);
    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    assert_eq!(
        fs::read_to_string(label).unwrap(),
        "1 0.250000 0.250000 0.500000 0.500000\n"
    );
}

#[test]
fn test_no_batches_writes_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("yolo_dataset");

    let result = DatasetBuilder::new(options(&output)).build(&[]);
    assert!(matches!(result, Err(PrepError::NoBatchesFound { .. })));
    assert!(!output.exists());

    let discovered = discover_batches(temp_dir.path(), &BatchLayout::default());
    assert!(matches!(discovered, Err(PrepError::NoBatchesFound { .. })));
}

#[test]
fn test_discover_batches_sorted_and_filtered() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    for name in ["output_batch_2", "output_batch_0", "output_batch_1", "other"] {
        fs::create_dir_all(root.join(name)).unwrap();
    }
    fs::write(root.join("output_batch_3"), b"a file, not a batch").unwrap();

    let found = batches(root);
    let names: Vec<&str> = found.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["output_batch_0", "output_batch_1", "output_batch_2"]);
    assert_eq!(found[0].annotation_path, root.join("output_batch_0/annotations.json"));
    assert_eq!(found[0].image_root, root.join("output_batch_0/rgb"));
}

#[test]
fn test_batches_without_usable_annotations_are_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("output_batch_0/rgb")).unwrap();
    write_file(&root.join("output_batch_1/annotations.json"), b"{ not json");
    make_batch(
        root,
        "output_batch_2",
        single_image_coco(0, [0.0, 0.0, 50.0, 50.0]),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let mut builder = DatasetBuilder::new(options(&output));
    let manifest = builder.build(&batches(root)).unwrap();

    let stats = builder.stats();
    assert_eq!(stats.batches_found, 3);
    assert_eq!(stats.batches_processed, 1);
    assert_eq!(stats.skipped_missing_annotation, 1);
    assert_eq!(stats.skipped_unreadable_annotation, 1);
    assert_eq!(manifest.class_names(), vec!["thing"]);
    assert_eq!(list_files(&output, "labels").len(), 1);
}

#[test]
fn test_fail_policy_aborts_on_missing_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        single_image_coco(0, [0.0, 0.0, 5.0, 5.0]),
        &[],
    );

    let mut options = options(&root.join("yolo_dataset"));
    options.missing_image = MissingImagePolicy::Fail;
    let result = DatasetBuilder::new(options).build(&batches(root));

    match result {
        Err(PrepError::UnresolvedImagePath {
            batch, file_name, ..
        }) => {
            assert_eq!(batch, "output_batch_0");
            assert_eq!(file_name, "seq_0/frame_00000.png");
        }
        other => panic!("expected UnresolvedImagePath, got {other:?}"),
    }
}

#[test]
fn test_placeholder_policy_writes_blank_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 0, "name": "thing"}],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 4, "height": 3}],
            "annotations": [{"image_id": 1, "category_id": 0, "bbox": [0.0, 0.0, 2.0, 3.0]}]
        }),
        &[],
    );
    let output = root.join("yolo_dataset");

    let mut options = options(&output);
    options.missing_image = MissingImagePolicy::Placeholder;
    let mut builder = DatasetBuilder::new(options);
    builder.build(&batches(root)).unwrap();

    let image_path =
        find_output(&output, "images", "output_batch_0_seq_0_frame_00000.png").unwrap();
    let placeholder = image::open(image_path).unwrap();
    assert_eq!((placeholder.width(), placeholder.height()), (4, 3));
    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    assert_eq!(
        fs::read_to_string(label).unwrap(),
        "0 0.250000 0.500000 0.500000 1.000000\n"
    );
    assert_eq!(builder.stats().placeholders_written, 1);
}

#[test]
fn test_unencodable_placeholder_leaves_no_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 0, "name": "thing"}],
            "images": [
                {"id": 1, "file_name": "frame_1.jpg", "width": 70000, "height": 1},
                {"id": 2, "file_name": "frame_2.png", "width": 100000, "height": 100000}
            ],
            "annotations": [{"image_id": 1, "category_id": 0, "bbox": [0.0, 0.0, 1.0, 1.0]}]
        }),
        &[],
    );
    let output = root.join("yolo_dataset");

    let mut options = options(&output);
    options.missing_image = MissingImagePolicy::Placeholder;
    let mut builder = DatasetBuilder::new(options);
    builder.build(&batches(root)).unwrap();

    assert!(list_files(&output, "images").is_empty());
    assert!(list_files(&output, "labels").is_empty());
    assert_eq!(builder.stats().skipped_unresolved_image, 2);
    assert_eq!(builder.stats().placeholders_written, 0);
    assert_eq!(builder.stats().labels_written, 0);
}

#[test]
fn test_label_name_keeps_dots_outside_the_extension() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    let layout = BatchLayout {
        pattern: "out.*".to_string(),
        ..BatchLayout::default()
    };
    make_batch(
        root,
        "out.v2",
        json!({
            "categories": [{"id": 0, "name": "thing"}],
            "images": [{"id": 1, "file_name": "frame", "width": 10, "height": 10}],
            "annotations": [{"image_id": 1, "category_id": 0, "bbox": [0.0, 0.0, 5.0, 5.0]}]
        }),
        &["frame"],
    );
    let output = root.join("yolo_dataset");

    DatasetBuilder::new(options(&output))
        .build(&discover_batches(root, &layout).unwrap())
        .unwrap();

    assert_eq!(list_files(&output, "images"), vec!["out.v2_frame"]);
    assert_eq!(list_files(&output, "labels"), vec!["out.v2_frame.txt"]);
}

#[test]
fn test_zero_sized_images_are_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 0, "height": 10}],
            "annotations": []
        }),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let mut builder = DatasetBuilder::new(options(&output));
    builder.build(&batches(root)).unwrap();

    assert_eq!(builder.stats().skipped_invalid_size, 1);
    assert!(list_files(&output, "images").is_empty());
}

#[test]
fn test_orphaned_annotations_are_ignored() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        json!({
            "categories": [{"id": 0, "name": "thing"}],
            "images": [{"id": 1, "file_name": "seq_0/frame_00000.png", "width": 10, "height": 10}],
            "annotations": [{"image_id": 99, "category_id": 0, "bbox": [0.0, 0.0, 5.0, 5.0]}]
        }),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");

    let mut builder = DatasetBuilder::new(options(&output));
    builder.build(&batches(root)).unwrap();

    assert_eq!(builder.stats().orphaned_annotations, 1);
    let label = find_output(&output, "labels", "output_batch_0_seq_0_frame_00000.txt").unwrap();
    assert_eq!(fs::read_to_string(label).unwrap(), "");
}

#[test]
fn test_seeded_builds_split_identically() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    let frames: Vec<String> = (0..20).map(|i| format!("seq_0/frame_{i:05}.png")).collect();
    let images: Vec<serde_json::Value> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| json!({"id": i, "file_name": f, "width": 8, "height": 8}))
        .collect();
    let frame_refs: Vec<&str> = frames.iter().map(String::as_str).collect();
    make_batch(
        root,
        "output_batch_0",
        json!({"categories": [], "images": images, "annotations": []}),
        &frame_refs,
    );

    let split_names = |output: &Path| -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(output.join("labels/train"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    };

    let out_a = root.join("out_a");
    let out_b = root.join("out_b");
    DatasetBuilder::new(options(&out_a))
        .build(&batches(root))
        .unwrap();
    DatasetBuilder::new(options(&out_b))
        .build(&batches(root))
        .unwrap();

    assert_eq!(split_names(&out_a), split_names(&out_b));
    assert_eq!(list_files(&out_a, "labels").len(), 20);
}

#[test]
fn test_force_recreate_controls_stale_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    make_batch(
        root,
        "output_batch_0",
        single_image_coco(0, [0.0, 0.0, 5.0, 5.0]),
        &["seq_0/frame_00000.png"],
    );
    let output = root.join("yolo_dataset");
    write_file(&output.join("stale.txt"), b"left over");

    let mut keep = options(&output);
    keep.force_recreate = false;
    DatasetBuilder::new(keep).build(&batches(root)).unwrap();
    assert!(output.join("stale.txt").exists());

    // Rebuilding over an existing tree is idempotent for image placement
    let mut again = options(&output);
    again.force_recreate = false;
    let mut builder = DatasetBuilder::new(again);
    builder.build(&batches(root)).unwrap();
    assert_eq!(builder.stats().images_already_present, 1);

    DatasetBuilder::new(options(&output))
        .build(&batches(root))
        .unwrap();
    assert!(!output.join("stale.txt").exists());
    assert_eq!(list_files(&output, "labels").len(), 1);
}
