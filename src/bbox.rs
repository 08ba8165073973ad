//! Bounding box conversion between COCO and YOLO conventions.

use crate::types::CocoAnnotation;

/// Convert a COCO box `[x_min, y_min, width, height]` in pixels to a YOLO box
/// `(x_center, y_center, width, height)` normalized to the image size.
///
/// Boxes reaching outside the image are not clamped. `img_width` and
/// `img_height` must be non-zero.
pub fn coco_to_yolo(bbox: [f64; 4], img_width: u32, img_height: u32) -> (f64, f64, f64, f64) {
    let [x_min, y_min, w, h] = bbox;
    let img_width = img_width as f64;
    let img_height = img_height as f64;

    let x_center = (x_min + w / 2.0) / img_width;
    let y_center = (y_min + h / 2.0) / img_height;
    let w_norm = w / img_width;
    let h_norm = h / img_height;

    (x_center, y_center, w_norm, h_norm)
}

/// Inverse of [`coco_to_yolo`].
pub fn yolo_to_coco(yolo: (f64, f64, f64, f64), img_width: u32, img_height: u32) -> [f64; 4] {
    let (x_center, y_center, w_norm, h_norm) = yolo;
    let w = w_norm * img_width as f64;
    let h = h_norm * img_height as f64;
    [
        x_center * img_width as f64 - w / 2.0,
        y_center * img_height as f64 - h / 2.0,
        w,
        h,
    ]
}

/// Format one label line; the category id is written verbatim.
pub fn format_label_line(category_id: u32, yolo: (f64, f64, f64, f64)) -> String {
    let (x_center, y_center, width, height) = yolo;
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}\n",
        category_id, x_center, y_center, width, height
    )
}

/// Build the content of a label file for one image.
pub fn convert_to_yolo_format(
    annotations: &[&CocoAnnotation],
    img_width: u32,
    img_height: u32,
) -> String {
    let mut yolo_data = String::with_capacity(annotations.len() * 48);
    for annotation in annotations {
        let yolo = coco_to_yolo(annotation.bbox, img_width, img_height);
        yolo_data.push_str(&format_label_line(annotation.category_id, yolo));
    }
    yolo_data
}
