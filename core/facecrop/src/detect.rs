//! Face detection contract and the adapter that turns raw classifier
//! output into candidate face rectangles.

use image::DynamicImage;

use crate::geometry::FaceRect;

/// Minimum clustered confidence for a detection to become a candidate.
pub const QUALITY_THRESHOLD: f32 = 5.0;

/// Mutual overlap (IoU) above which two raw detections are merged into one.
const CLUSTER_OVERLAP: f32 = 0.18;

/// One raw face detection: center position, scale (approximately the face
/// diameter) and confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Center column of the face, in pixels.
    pub col: i32,
    /// Center row of the face, in pixels.
    pub row: i32,
    /// Side of the square region the face occupies, in pixels.
    pub scale: i32,
    /// Classifier confidence. Higher is better; the range is
    /// backend-specific.
    pub score: f32,
}

/// Pluggable face detection backend.
///
/// The input is a row-major 8-bit luminance buffer of `width` x `height`
/// bytes. Implementations carry no per-call state beyond their immutably
/// loaded model, so a single instance is safe to share across concurrent
/// requests.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in the luminance buffer. An image with zero faces
    /// yields an empty vector, never an error.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<Detection>;
}

/// Run `detector` over `image` and merge overlapping detections.
///
/// The raster is reduced to grayscale luminance before the classifier sees
/// it. Never fails: no faces means an empty vector.
pub fn detect_faces(image: &DynamicImage, detector: &dyn FaceDetector) -> Vec<Detection> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();

    let raw = detector.detect(gray.as_raw(), width, height);
    let merged = cluster_detections(raw, CLUSTER_OVERLAP);
    tracing::debug!(faces = merged.len(), "face detection complete");
    merged
}

/// Keep detections scoring above `quality_threshold`, in detector order,
/// converted to square face rectangles.
///
/// No re-ranking happens here: the first rectangle returned is the first
/// the detector reported, and downstream code treats it as the primary
/// face. An empty result means the no-face fallback applies.
pub fn select_candidates(detections: &[Detection], quality_threshold: f32) -> Vec<FaceRect> {
    detections
        .iter()
        .filter(|d| d.score > quality_threshold)
        .map(|d| {
            let half = i64::from(d.scale / 2);
            FaceRect {
                min_x: i64::from(d.col) - half,
                min_y: i64::from(d.row) - half,
                max_x: i64::from(d.col) + half,
                max_y: i64::from(d.row) + half,
            }
        })
        .collect()
}

/// Merge detections whose implied square boxes overlap more than
/// `threshold`.
///
/// Cluster members collapse into a single detection at the score-weighted
/// mean position and scale, with scores summed, so a face confirmed by
/// several raw windows outranks a single marginal hit. Output order follows
/// the first member of each cluster.
fn cluster_detections(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    let mut assigned = vec![false; detections.len()];
    let mut merged = Vec::with_capacity(detections.len());

    for i in 0..detections.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut members = vec![detections[i]];
        for j in (i + 1)..detections.len() {
            if !assigned[j] && overlap(&detections[i], &detections[j]) > threshold {
                assigned[j] = true;
                members.push(detections[j]);
            }
        }
        merged.push(merge_cluster(&members));
    }

    merged
}

/// Intersection over union of the square boxes implied by center + scale.
fn overlap(a: &Detection, b: &Detection) -> f32 {
    let (ax0, ay0, ax1, ay1) = square_of(a);
    let (bx0, by0, bx1, by1) = square_of(b);

    let ix = (ax1.min(bx1) - ax0.max(bx0)).max(0) as f32;
    let iy = (ay1.min(by1) - ay0.max(by0)).max(0) as f32;
    let intersection = ix * iy;

    let area_a = (ax1 - ax0) as f32 * (ay1 - ay0) as f32;
    let area_b = (bx1 - bx0) as f32 * (by1 - by0) as f32;
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

fn square_of(d: &Detection) -> (i64, i64, i64, i64) {
    let half = i64::from(d.scale / 2);
    let col = i64::from(d.col);
    let row = i64::from(d.row);
    (col - half, row - half, col + half, row + half)
}

fn merge_cluster(members: &[Detection]) -> Detection {
    if members.len() == 1 {
        return members[0];
    }

    let total: f32 = members.iter().map(|d| d.score).sum();
    if total <= 0.0 {
        // Degenerate scores: fall back to the strongest-by-order member.
        return members[0];
    }

    let weighted = |f: fn(&Detection) -> f32| {
        members.iter().map(|d| f(d) * d.score).sum::<f32>() / total
    };
    Detection {
        col: weighted(|d| d.col as f32).round() as i32,
        row: weighted(|d| d.row as f32).round() as i32,
        scale: weighted(|d| d.scale as f32).round() as i32,
        score: total,
    }
}
