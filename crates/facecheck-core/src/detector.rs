//! SCRFD face detector via ONNX Runtime.
//!
//! Letterboxes an RGB image into the 640×640 model input, decodes the three
//! stride levels anchor-free and suppresses overlaps with NMS.

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: u32 = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} (download it from insightface into the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Scale and padding applied by the letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl LetterboxInfo {
    fn for_image(width: u32, height: u32) -> Self {
        let size = SCRFD_INPUT_SIZE as f32;
        let scale = (size / width as f32).min(size / height as f32);
        let new_w = (width as f32 * scale).round();
        let new_h = (height as f32 * scale).round();
        Self {
            scale,
            pad_x: ((size - new_w) / 2.0).floor(),
            pad_y: ((size - new_h) / 2.0).floor(),
        }
    }

    /// Map a point from letterboxed model space back to the source image.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Output tensor indices for one stride: (score_idx, bbox_idx, kps_idx).
type StrideOutputIndices = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    /// Per-stride output indices for strides [8, 16, 32].
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path, intra_threads: usize) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self {
            session,
            stride_indices,
        })
    }

    /// Detect faces, returning bounding boxes sorted by descending confidence.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, DetectorError> {
        let (input, letterbox) = preprocess(image);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();

        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;
            let (_, kps) = outputs[kps_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("kps stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                StrideOutputs { scores, bboxes, kps },
                stride,
                &letterbox,
                SCRFD_CONFIDENCE_THRESHOLD,
            ));
        }

        let result = nms(all_detections, SCRFD_NMS_THRESHOLD);
        tracing::debug!(faces = result.len(), "SCRFD detection complete");
        Ok(result)
    }
}

/// Letterbox the image into a normalized 1×3×640×640 tensor.
///
/// Padding uses the mean value so it normalizes to 0.0.
fn preprocess(image: &RgbImage) -> (Array4<f32>, LetterboxInfo) {
    let letterbox = LetterboxInfo::for_image(image.width(), image.height());
    let new_w = ((image.width() as f32 * letterbox.scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
    let new_h = ((image.height() as f32 * letterbox.scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let size = SCRFD_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    let (pad_x, pad_y) = (letterbox.pad_x as usize, letterbox.pad_y as usize);
    for (x, y, px) in resized.enumerate_pixels() {
        let (tx, ty) = (x as usize + pad_x, y as usize + pad_y);
        if tx >= size || ty >= size {
            continue;
        }
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (px[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
        }
    }

    (tensor, letterbox)
}

/// Discover output tensor ordering by name.
///
/// Named exports ("score_8", "bbox_16", "kps_32", ...) are mapped to stride
/// slots; anything else falls back to positional ordering:
///   [0-2] = scores, [3-5] = bboxes, [6-8] = kps (strides 8, 16, 32).
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&stride| Some((find("score", stride)?, find("bbox", stride)?, find("kps", stride)?)))
        .collect();

    match named {
        Some(indices) => {
            tracing::info!("SCRFD: using name-based output tensor mapping");
            [indices[0], indices[1], indices[2]]
        }
        None => {
            tracing::info!(?names, "SCRFD: output names not recognized, using positional mapping");
            [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
        }
    }
}

/// Raw tensors for one stride level.
struct StrideOutputs<'a> {
    scores: &'a [f32],
    bboxes: &'a [f32],
    kps: &'a [f32],
}

/// Decode detections for a single stride level into source-image coordinates.
fn decode_stride(
    out: StrideOutputs<'_>,
    stride: usize,
    letterbox: &LetterboxInfo,
    threshold: f32,
) -> Vec<BoundingBox> {
    let grid = SCRFD_INPUT_SIZE as usize / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let s = stride as f32;

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = out.scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let cell = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_x = (cell % grid) as f32 * s;
        let anchor_y = (cell / grid) as f32 * s;

        let Some(b) = out.bboxes.get(idx * 4..idx * 4 + 4) else {
            continue;
        };
        let (x1, y1) = letterbox.unmap(anchor_x - b[0] * s, anchor_y - b[1] * s);
        let (x2, y2) = letterbox.unmap(anchor_x + b[2] * s, anchor_y + b[3] * s);

        let landmarks = out.kps.get(idx * 10..idx * 10 + 10).map(|k| {
            std::array::from_fn(|i| letterbox.unmap(anchor_x + k[i * 2] * s, anchor_y + k[i * 2 + 1] * s))
        });

        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
            landmarks,
        });
    }

    detections
}

/// Non-Maximum Suppression. Output is sorted by descending confidence.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<BoundingBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(k, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union_area = a.width * a.height + b.width * b.height - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bbox_at(x: f32, y: f32, w: f32, h: f32, conf: f32) -> BoundingBox {
        BoundingBox {
            x, y, width: w, height: h, confidence: conf, landmarks: None,
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = bbox_at(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = bbox_at(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = bbox_at(20.0, 20.0, 10.0, 10.0, 1.0);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial() {
        let a = bbox_at(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = bbox_at(5.0, 0.0, 10.0, 10.0, 1.0);
        // Overlap 50, union 150.
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping_and_sorts() {
        let detections = vec![
            bbox_at(200.0, 200.0, 50.0, 50.0, 0.7),
            bbox_at(5.0, 5.0, 100.0, 100.0, 0.8),
            bbox_at(0.0, 0.0, 100.0, 100.0, 0.9),
        ];
        let result = nms(detections, 0.4);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nms_empty() {
        assert!(nms(vec![], 0.4).is_empty());
    }

    #[test]
    fn test_letterbox_unmap_roundtrip() {
        let letterbox = LetterboxInfo::for_image(320, 240);
        let (ox, oy) = (100.0f32, 50.0f32);
        let lx = ox * letterbox.scale + letterbox.pad_x;
        let ly = oy * letterbox.scale + letterbox.pad_y;
        let (rx, ry) = letterbox.unmap(lx, ly);
        assert!((rx - ox).abs() < 0.1, "x: {rx} vs {ox}");
        assert!((ry - oy).abs() < 0.1, "y: {ry} vs {oy}");
    }

    #[test]
    fn test_preprocess_pads_with_zero() {
        // 640×320 letterboxes to full width, 160px vertical padding each side.
        let image = RgbImage::from_pixel(640, 320, Rgb([255, 255, 255]));
        let (tensor, letterbox) = preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_eq!(letterbox.pad_y, 160.0);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        let inside = tensor[[0, 1, 320, 320]];
        assert!((inside - (255.0 - SCRFD_MEAN) / SCRFD_STD).abs() < 1e-3);
    }

    #[test]
    fn test_decode_stride_single_anchor() {
        let letterbox = LetterboxInfo { scale: 1.0, pad_x: 0.0, pad_y: 0.0 };
        let grid = 640 / 32;
        let anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
        let mut scores = vec![0.0f32; anchors];
        let mut bboxes = vec![0.0f32; anchors * 4];
        let kps = vec![0.0f32; anchors * 10];

        // Anchor 3 → cell 1 → (x=32, y=0).
        scores[3] = 0.9;
        bboxes[12..16].copy_from_slice(&[0.5, 0.0, 0.5, 1.0]);

        let dets = decode_stride(
            StrideOutputs { scores: &scores, bboxes: &bboxes, kps: &kps },
            32,
            &letterbox,
            0.5,
        );
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert!((d.x - 16.0).abs() < 1e-4);
        assert!((d.width - 32.0).abs() < 1e-4);
        assert!((d.height - 32.0).abs() < 1e-4);
        assert_eq!(d.landmarks.map(|l| l[0]), Some((32.0, 0.0)));
    }

    #[test]
    fn test_discover_output_indices_named() {
        let names: Vec<String> = [
            "score_8", "score_16", "score_32",
            "bbox_8",  "bbox_16",  "bbox_32",
            "kps_8",   "kps_16",   "kps_32",
        ].iter().map(|s| s.to_string()).collect();

        assert_eq!(discover_output_indices(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }

    #[test]
    fn test_discover_output_indices_shuffled_named() {
        let names: Vec<String> = [
            "bbox_8", "kps_8", "score_8",
            "bbox_16", "kps_16", "score_16",
            "bbox_32", "kps_32", "score_32",
        ].iter().map(|s| s.to_string()).collect();

        assert_eq!(discover_output_indices(&names), [(2, 0, 1), (5, 3, 4), (8, 6, 7)]);
    }

    #[test]
    fn test_discover_output_indices_positional_fallback() {
        let names: Vec<String> = (0..9).map(|i: usize| i.to_string()).collect();
        assert_eq!(discover_output_indices(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }
}
