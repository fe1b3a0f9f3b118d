//! Geometric reduction of landmark sets into tracked scalars
//!
//! All functions here are pure. Units differ per metric and are not
//! calibrated: face position is normalized, face depth is a unitless proxy and
//! body distance is a raw pixel area.

use crate::config::{DEFAULT_MIN_VISIBLE_POINTS, DEFAULT_VISIBILITY_THRESHOLD};
use crate::tracking::landmarks::{BoundingBox, FrameSize, PoseDetection, PoseLandmark};

/// Joints used for the body distance box (head and torso only)
pub const DISTANCE_JOINTS: [PoseLandmark; 5] = [
    PoseLandmark::Nose,
    PoseLandmark::LeftShoulder,
    PoseLandmark::RightShoulder,
    PoseLandmark::LeftHip,
    PoseLandmark::RightHip,
];

/// Face position and depth proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMetrics {
    /// Normalized centre x
    pub x: f64,
    /// Normalized centre y
    pub y: f64,
    /// Relative depth: `2.0 - area`. Grows as the face gets smaller/farther.
    pub z: f64,
}

/// Box centre and depth proxy for a normalized face box
pub fn face_metrics(bbox: &BoundingBox) -> FaceMetrics {
    FaceMetrics {
        x: bbox.xmin + bbox.width / 2.0,
        y: bbox.ymin + bbox.height / 2.0,
        z: 2.0 - bbox.area(),
    }
}

/// Tunables for the body distance estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSettings {
    /// A joint must be strictly more visible than this to count
    pub visibility_threshold: f64,
    /// Fewer visible joints than this yields no estimate
    pub min_visible_points: usize,
}

impl Default for DistanceSettings {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            min_visible_points: DEFAULT_MIN_VISIBLE_POINTS,
        }
    }
}

/// Pixel area of the box around the visible head/torso joints.
///
/// Returns `None` when too few key joints are visible, or when the box is not
/// a finite area; callers skip the distance telemetry for that frame. Points
/// with non-finite coordinates never count as visible.
pub fn body_distance(
    pose: &PoseDetection,
    size: FrameSize,
    settings: &DistanceSettings,
) -> Option<f64> {
    let visible: Vec<(f64, f64)> = DISTANCE_JOINTS
        .iter()
        .filter_map(|&joint| pose.get(joint))
        .filter(|point| point.visibility > settings.visibility_threshold && point.is_finite())
        .map(|point| point.to_pixels(size))
        .collect();

    if visible.len() < settings.min_visible_points {
        tracing::trace!(
            visible = visible.len(),
            required = settings.min_visible_points,
            "Not enough visible joints for distance"
        );
        return None;
    }

    let (mut x_min, mut y_min) = visible[0];
    let (mut x_max, mut y_max) = visible[0];
    for &(x, y) in &visible[1..] {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let area = (x_max - x_min) * (y_max - y_min);
    if !area.is_finite() {
        tracing::debug!(area, "Discarding non-finite body distance");
        return None;
    }

    Some(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::LandmarkPoint;

    fn pose_with(points: &[(PoseLandmark, f64, f64, f64)]) -> PoseDetection {
        let mut landmarks = vec![LandmarkPoint::new(0.0, 0.0, Some(0.0), 0.0); PoseLandmark::COUNT];
        for &(joint, x, y, visibility) in points {
            landmarks[joint.index()] = LandmarkPoint::new(x, y, Some(0.0), visibility);
        }
        PoseDetection::new(landmarks)
    }

    fn upright_pose(visibility: f64) -> PoseDetection {
        pose_with(&[
            (PoseLandmark::Nose, 0.5, 0.2, visibility),
            (PoseLandmark::LeftShoulder, 0.6, 0.4, visibility),
            (PoseLandmark::RightShoulder, 0.4, 0.4, visibility),
            (PoseLandmark::LeftHip, 0.575, 0.8, visibility),
            (PoseLandmark::RightHip, 0.425, 0.8, visibility),
        ])
    }

    #[test]
    fn test_face_metrics() {
        let m = face_metrics(&BoundingBox::new(0.4, 0.3, 0.2, 0.2));
        assert!((m.x - 0.5).abs() < 1e-12);
        assert!((m.y - 0.4).abs() < 1e-12);
        assert!((m.z - 1.96).abs() < 1e-12);
    }

    #[test]
    fn test_face_depth_decreases_with_area() {
        let near = face_metrics(&BoundingBox::new(0.1, 0.1, 0.6, 0.6));
        let far = face_metrics(&BoundingBox::new(0.45, 0.45, 0.1, 0.1));
        assert!(far.z > near.z);
    }

    #[test]
    fn test_body_distance_all_visible() {
        let area = body_distance(&upright_pose(0.95), FrameSize::new(640, 480), &DistanceSettings::default());
        // x: 0.4*640=256 .. 0.6*640=384, y: 0.2*480=96 .. 0.8*480=384
        assert_eq!(area, Some(128.0 * 288.0));
    }

    #[test]
    fn test_body_distance_insufficient_points() {
        let pose = pose_with(&[
            (PoseLandmark::Nose, 0.5, 0.2, 0.9),
            (PoseLandmark::LeftShoulder, 0.6, 0.4, 0.9),
            (PoseLandmark::RightShoulder, 0.4, 0.4, 0.9),
            (PoseLandmark::LeftHip, 0.575, 0.8, 0.5),
            (PoseLandmark::RightHip, 0.425, 0.8, 0.7),
        ]);
        assert_eq!(
            body_distance(&pose, FrameSize::default(), &DistanceSettings::default()),
            None
        );
    }

    #[test]
    fn test_body_distance_threshold_is_exclusive() {
        assert_eq!(
            body_distance(&upright_pose(0.7), FrameSize::default(), &DistanceSettings::default()),
            None
        );
    }

    #[test]
    fn test_body_distance_four_points() {
        let pose = pose_with(&[
            (PoseLandmark::Nose, 0.5, 0.2, 0.2),
            (PoseLandmark::LeftShoulder, 0.6, 0.4, 0.9),
            (PoseLandmark::RightShoulder, 0.4, 0.4, 0.9),
            (PoseLandmark::LeftHip, 0.575, 0.8, 0.9),
            (PoseLandmark::RightHip, 0.425, 0.8, 0.9),
        ]);
        // Nose ignored: y spans the shoulders (192) to the hips (384)
        let area = body_distance(&pose, FrameSize::new(640, 480), &DistanceSettings::default());
        assert_eq!(area, Some(128.0 * 192.0));
    }

    #[test]
    fn test_body_distance_custom_settings() {
        let pose = pose_with(&[
            (PoseLandmark::LeftShoulder, 0.6, 0.4, 0.6),
            (PoseLandmark::RightShoulder, 0.4, 0.5, 0.6),
        ]);
        let settings = DistanceSettings {
            visibility_threshold: 0.5,
            min_visible_points: 2,
        };
        let area = body_distance(&pose, FrameSize::new(100, 100), &settings);
        assert_eq!(area, Some(20.0 * 10.0));
    }

    #[test]
    fn test_body_distance_out_of_range_point() {
        let pose = pose_with(&[
            (PoseLandmark::Nose, 1e10, 1e10, 0.9),
            (PoseLandmark::LeftShoulder, 0.6, 0.4, 0.9),
            (PoseLandmark::RightShoulder, 0.4, 0.4, 0.9),
            (PoseLandmark::LeftHip, 0.575, 0.8, 0.9),
        ]);
        let area = body_distance(&pose, FrameSize::new(640, 480), &DistanceSettings::default())
            .unwrap();
        assert!(area.is_finite());
        assert!(area > 0.0);

        let huge = pose_with(&[
            (PoseLandmark::Nose, 1e300, 1e300, 0.9),
            (PoseLandmark::LeftShoulder, -1e300, -1e300, 0.9),
            (PoseLandmark::RightShoulder, 0.4, 0.4, 0.9),
            (PoseLandmark::LeftHip, 0.575, 0.8, 0.9),
        ]);
        assert_eq!(
            body_distance(&huge, FrameSize::new(640, 480), &DistanceSettings::default()),
            None
        );
    }

    #[test]
    fn test_body_distance_skips_non_finite_points() {
        let pose = pose_with(&[
            (PoseLandmark::Nose, f64::NAN, 0.2, 0.9),
            (PoseLandmark::LeftShoulder, 0.6, 0.4, 0.9),
            (PoseLandmark::RightShoulder, 0.4, 0.4, 0.9),
            (PoseLandmark::LeftHip, 0.575, 0.8, 0.9),
            (PoseLandmark::RightHip, 0.425, f64::INFINITY, 0.9),
        ]);
        // Only three finite joints remain
        assert_eq!(
            body_distance(&pose, FrameSize::new(640, 480), &DistanceSettings::default()),
            None
        );

        let settings = DistanceSettings {
            min_visible_points: 3,
            ..DistanceSettings::default()
        };
        let area = body_distance(&pose, FrameSize::new(640, 480), &settings);
        // x: 256 .. 384, y: 192 .. 384
        assert_eq!(area, Some(128.0 * 192.0));
    }

    #[test]
    fn test_body_distance_truncated_skeleton() {
        let pose = PoseDetection::new(vec![LandmarkPoint::new(0.5, 0.2, None, 1.0)]);
        assert_eq!(
            body_distance(&pose, FrameSize::default(), &DistanceSettings::default()),
            None
        );
    }

    #[test]
    fn test_body_distance_scales_with_resolution() {
        let pose = upright_pose(0.95);
        let small = body_distance(&pose, FrameSize::new(320, 240), &DistanceSettings::default()).unwrap();
        let large = body_distance(&pose, FrameSize::new(1280, 720), &DistanceSettings::default()).unwrap();
        assert!(large > small);
    }
}
