//! Picks the one face to track when the detector reports several

use crate::tracking::landmarks::FaceDetection;

/// Select the face with the largest box area.
///
/// Ties go to the earliest detection. Boxes with a zero, negative or
/// non-finite area never win, so an empty or all-degenerate list yields
/// `None` and the frame is skipped.
pub fn select_largest(detections: &[FaceDetection]) -> Option<&FaceDetection> {
    let mut best: Option<(&FaceDetection, f64)> = None;

    for detection in detections {
        let area = detection.bbox.area();
        if !area.is_finite() || area <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((detection, area)),
        }
    }

    best.map(|(detection, _)| detection)
}
