//! Landmark data model
//!
//! Everything here is produced fresh per frame by the external detector and
//! only lives for the duration of one `TrackingPipeline::process` call.
//! Positions are normalized to the frame: `x`/`y` in [0, 1] with the origin at
//! the top-left corner.

use serde::{Deserialize, Serialize};

/// A single tracked anatomical point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Normalized horizontal position
    pub x: f64,
    /// Normalized vertical position
    pub y: f64,
    /// Normalized depth, when the detector provides one
    #[serde(default)]
    pub z: Option<f64>,
    /// Visibility / confidence score (0.0 - 1.0)
    #[serde(default)]
    pub visibility: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: Option<f64>, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Whole-pixel coordinates (truncated toward zero, like the overlay does).
    ///
    /// Kept as `f64` so out-of-frame points cannot overflow later arithmetic.
    pub fn to_pixels(&self, size: FrameSize) -> (f64, f64) {
        (
            (self.x * size.width as f64).trunc(),
            (self.y * size.height as f64).trunc(),
        )
    }

    /// Both planar coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Normalized face bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, width: f64, height: f64) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
        }
    }

    /// Normalized area (fraction of the frame covered)
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One candidate face from the face detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub confidence: f64,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            bbox,
            confidence,
        }
    }
}

/// Joints of the 33-point MediaPipe pose schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl PoseLandmark {
    /// Number of joints in a complete skeleton
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A body pose: the full skeleton, indexed by `PoseLandmark`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseDetection {
    pub landmarks: Vec<LandmarkPoint>,
}

impl PoseDetection {
    pub fn new(landmarks: Vec<LandmarkPoint>) -> Self {
        Self { landmarks }
    }

    /// Look up a joint. Truncated skeletons yield `None` for missing joints.
    pub fn get(&self, joint: PoseLandmark) -> Option<&LandmarkPoint> {
        self.landmarks.get(joint.index())
    }
}

/// Frame dimensions in pixels, used to denormalize landmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Raw detector result for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorOutput {
    /// Zero or more face candidates
    Face(Vec<FaceDetection>),
    /// At most one body pose
    Body(Option<PoseDetection>),
}

/// One frame handed to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture time in seconds
    pub timestamp: f64,
    pub size: FrameSize,
    pub output: DetectorOutput,
}

impl Frame {
    pub fn new(timestamp: f64, size: FrameSize, output: DetectorOutput) -> Self {
        Self {
            timestamp,
            size,
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_landmark_indices() {
        assert_eq!(PoseLandmark::Nose.index(), 0);
        assert_eq!(PoseLandmark::LeftShoulder.index(), 11);
        assert_eq!(PoseLandmark::RightWrist.index(), 16);
        assert_eq!(PoseLandmark::RightHip.index(), 24);
        assert_eq!(PoseLandmark::RightFootIndex.index(), PoseLandmark::COUNT - 1);
    }

    #[test]
    fn test_truncated_skeleton_lookup() {
        let pose = PoseDetection::new(vec![LandmarkPoint::new(0.5, 0.5, None, 1.0)]);
        assert!(pose.get(PoseLandmark::Nose).is_some());
        assert!(pose.get(PoseLandmark::LeftShoulder).is_none());
    }

    #[test]
    fn test_to_pixels_truncates() {
        let p = LandmarkPoint::new(0.5019, 0.2501, None, 1.0);
        assert_eq!(p.to_pixels(FrameSize::new(640, 480)), (321.0, 120.0));

        let left = LandmarkPoint::new(-0.0019, 0.5, None, 1.0);
        assert_eq!(left.to_pixels(FrameSize::new(640, 480)), (-1.0, 240.0));
    }

    #[test]
    fn test_non_finite_point() {
        assert!(LandmarkPoint::new(0.5, 0.5, None, 1.0).is_finite());
        assert!(!LandmarkPoint::new(f64::NAN, 0.5, None, 1.0).is_finite());
        assert!(!LandmarkPoint::new(0.5, f64::INFINITY, None, 1.0).is_finite());
    }

    #[test]
    fn test_parse_landmark_without_z() {
        let p: LandmarkPoint = serde_json::from_str(r#"{"x":0.1,"y":0.2,"visibility":0.9}"#).unwrap();
        assert!(p.z.is_none());
        assert!((p.visibility - 0.9).abs() < 1e-9);
    }
}
