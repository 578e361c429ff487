/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing.
/// Boxes are mapped back to source pixel coordinates but deliberately left
/// unclipped; cropping clamps them later.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::infrastructure::math::bbox_iou;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::face_image::FaceImage;
use crate::shared::onnx_session::open_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// YOLO face detector backed by an ONNX Runtime session.
///
/// The session is locked per inference, so concurrent callers queue on the
/// model while everything around it runs in parallel.
pub struct OnnxYoloDetector {
    session: Mutex<ort::session::Session>,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("Face detector input size: {input_size}");

        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    /// Runs the model and returns `(output_shape, flat_output)`.
    fn infer(
        &self,
        tensor: ndarray::Array4<f32>,
    ) -> Result<(Vec<usize>, Vec<f32>), Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let array = outputs[0].try_extract_array::<f32>()?;
        let shape = array.shape().to_vec();
        let data = array.iter().copied().collect();
        Ok((shape, data))
    }

    fn detect_inner(
        &self,
        image: &FaceImage,
        options: &DetectionOptions,
    ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(image, self.input_size);
        let (shape, data) = self.infer(input_tensor)?;

        let mut raw = parse_detections(&shape, &data, options, scale, pad_x, pad_y)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        let min_width = options.min_face_size * image.width() as f64;
        let faces = kept
            .into_iter()
            .filter(|d| d.x2 - d.x1 >= min_width)
            .enumerate()
            .map(|(i, d)| DetectedFace {
                bounding_box: BoundingBox::from_corners(d.x1, d.y1, d.x2, d.y2),
                tracking_id: options.tracking.then_some(i as u32),
                confidence: d.confidence,
                landmarks: d.keypoints.map(FaceLandmarks::new),
            })
            .collect();
        Ok(faces)
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(
        &self,
        image: &FaceImage,
        options: &DetectionOptions,
    ) -> Result<Vec<DetectedFace>, DetectionError> {
        Ok(self.detect_inner(image, options)?)
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Decodes raw YOLO rows into detections in source-image coordinates.
///
/// YOLO output is `[1, features, detections]` (transposed) or
/// `[1, detections, features]`; both layouts are accepted. Row format:
/// `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_detections(
    shape: &[usize],
    data: &[f32],
    options: &DetectionOptions,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err("YOLO output is shorter than its shape".into());
    }

    let unletterbox_x = |v: f64| (v - pad_x as f64) / scale;
    let unletterbox_y = |v: f64| (v - pad_y as f64) / scale;

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let row: Vec<f32> = if transposed {
            (0..num_feats).map(|f| data[f * num_dets + i]).collect()
        } else {
            data[i * num_feats..(i + 1) * num_feats].to_vec()
        };
        if row.len() < 5 {
            continue;
        }
        let conf = row[4] as f64;
        if conf < options.confidence {
            continue;
        }

        let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);

        let keypoints = if options.landmarks && row.len() >= 5 + NUM_KEYPOINT_VALUES {
            let mut pts = [(0.0f64, 0.0f64); 5];
            for (k, pt) in pts.iter_mut().enumerate() {
                let base = 5 + k * 3;
                if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                    *pt = (
                        unletterbox_x(row[base] as f64),
                        unletterbox_y(row[base + 1] as f64),
                    );
                }
            }
            Some(pts)
        } else {
            None
        };

        dets.push(RawDetection {
            x1: unletterbox_x(cx - w / 2.0),
            y1: unletterbox_y(cy - h / 2.0),
            x2: unletterbox_x(cx + w / 2.0),
            y2: unletterbox_y(cy + h / 2.0),
            confidence: conf,
            keypoints,
        });
    }
    Ok(dets)
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize an image to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(image: &FaceImage, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = image.width() as f64;
    let fh = image.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = image.as_ndarray();
    let src_h = image.height() as usize;
    let src_w = image.width() as usize;
    let channels = (image.channels() as usize).min(3);

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                // Grayscale sources replicate their single channel.
                let sc = c.min(channels - 1);
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Option<[(f64, f64); 5]>,
}

impl RawDetection {
    fn corners(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let suppressed = keep
            .iter()
            .any(|k| bbox_iou(&k.corners(), &det.corners()) > iou_thresh);
        if !suppressed {
            keep.push(det.clone());
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            keypoints: None,
        }
    }

    fn options(confidence: f64, landmarks: bool) -> DetectionOptions {
        DetectionOptions {
            confidence,
            landmarks,
            ..Default::default()
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let image = FaceImage::new(vec![128u8; 200 * 100 * 3], 200, 100, 3);
        let (tensor, scale, pad_x, pad_y) = letterbox(&image, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(scale, 3.2, epsilon = 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let image = FaceImage::new(vec![255u8; 100 * 50 * 3], 100, 50, 3);
        let (tensor, _, pad_x, pad_y) = letterbox(&image, 640);

        let y = pad_y as usize + 1;
        let x = pad_x as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, x]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_replicates_grayscale_channel() {
        let image = FaceImage::new(vec![255u8; 10 * 10], 10, 10, 1);
        let (tensor, ..) = letterbox(&image, 20);
        assert_relative_eq!(tensor[[0, 2, 5, 5]], 1.0, epsilon = 0.01);
    }

    /// Lays rows out as `[1, detections, features]`, padding with
    /// zero-confidence rows so detections outnumber features.
    fn row_major(rows: Vec<Vec<f32>>) -> (Vec<usize>, Vec<f32>) {
        let feats = rows[0].len();
        let dets = rows.len().max(feats + 1);
        let mut data: Vec<f32> = rows.into_iter().flatten().collect();
        data.resize(dets * feats, 0.0);
        (vec![1, dets, feats], data)
    }

    #[test]
    fn test_parse_row_major_layout_and_unletterbox() {
        let (shape, data) = row_major(vec![vec![50.0, 60.0, 20.0, 40.0, 0.9]]);
        let dets = parse_detections(&shape, &data, &options(0.5, false), 2.0, 10, 0).unwrap();

        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].x1, (40.0 - 10.0) / 2.0);
        assert_relative_eq!(dets[0].y1, 20.0);
        assert_relative_eq!(dets[0].x2, (60.0 - 10.0) / 2.0);
        assert_relative_eq!(dets[0].y2, 40.0);
    }

    #[test]
    fn test_parse_transposed_layout() {
        // [1, 5 features, 8 detections]; only detection 0 is confident
        let num_dets = 8;
        let mut data = vec![0.0f32; 5 * num_dets];
        data[0] = 10.0; // cx
        data[num_dets] = 10.0; // cy
        data[2 * num_dets] = 4.0; // w
        data[3 * num_dets] = 4.0; // h
        data[4 * num_dets] = 0.9; // conf
        let dets =
            parse_detections(&[1, 5, num_dets], &data, &options(0.5, false), 1.0, 0, 0).unwrap();
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].x1, 8.0);
        assert_relative_eq!(dets[0].y2, 12.0);
    }

    #[test]
    fn test_parse_keypoints_only_when_requested() {
        let mut row = vec![50.0, 50.0, 20.0, 20.0, 0.9];
        for k in 0..5 {
            row.extend_from_slice(&[40.0 + k as f32, 45.0, 0.9]);
        }
        let (shape, data) = row_major(vec![row]);

        let without = parse_detections(&shape, &data, &options(0.5, false), 1.0, 0, 0).unwrap();
        assert!(without[0].keypoints.is_none());

        let with = parse_detections(&shape, &data, &options(0.5, true), 1.0, 0, 0).unwrap();
        let pts = with[0].keypoints.unwrap();
        assert_relative_eq!(pts[2].0, 42.0);
    }

    #[test]
    fn test_parse_confidence_filter() {
        let (shape, data) = row_major(vec![
            vec![10.0, 10.0, 4.0, 4.0, 0.4],
            vec![30.0, 30.0, 4.0, 4.0, 0.6],
        ]);
        let dets = parse_detections(&shape, &data, &options(0.5, false), 1.0, 0, 0).unwrap();
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].confidence, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(parse_detections(&[1, 5], &[0.0; 5], &options(0.5, false), 1.0, 0, 0).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            raw(0.0, 0.0, 100.0, 100.0, 0.8),
            raw(5.0, 5.0, 105.0, 105.0, 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![
            raw(0.0, 0.0, 50.0, 50.0, 0.9),
            raw(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<RawDetection> = Vec::new();
        assert!(nms(&mut dets, 0.3).is_empty());
    }
}
