//! Per-frame tracking pipeline
//!
//! Turns one frame of detector output into telemetry records:
//! candidate selection, metric extraction, then per-channel One-Euro
//! filtering. Face and body tracking are mutually exclusive modes. Filter
//! channels are keyed by mode ("face.x", "body.distance", ...), so state from
//! one mode never feeds the other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{FilterSettings, PipelineConfig};
use crate::error::ConfigError;
use crate::output::{address, TelemetryRecord};
use crate::tracking::filter::FilterBank;
use crate::tracking::landmarks::{
    DetectorOutput, FaceDetection, Frame, FrameSize, LandmarkPoint, PoseDetection, PoseLandmark,
};
use crate::tracking::metrics::{self, DistanceSettings};
use crate::tracking::selector;
use crate::tracking::stats::FrameStats;

/// Which detector output the pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    #[default]
    Face,
    Body,
}

impl TrackingMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Face => Self::Body,
            Self::Body => Self::Face,
        }
    }

    /// Prefix shared by every filter channel of this mode
    pub fn channel_prefix(self) -> &'static str {
        match self {
            Self::Face => "face",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel_prefix())
    }
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "face" => Ok(Self::Face),
            "body" | "pose" => Ok(Self::Body),
            other => Err(format!("unknown tracking mode '{}' (expected face or body)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of(self, point: &LandmarkPoint) -> Option<f64> {
        match self {
            Axis::X => Some(point.x),
            Axis::Y => Some(point.y),
            Axis::Z => point.z,
        }
    }
}

/// Body joint channels sent alongside the distance
struct JointChannel {
    joint: PoseLandmark,
    axis: Axis,
    channel: &'static str,
    address: &'static str,
}

const fn joint(
    joint: PoseLandmark,
    axis: Axis,
    channel: &'static str,
    address: &'static str,
) -> JointChannel {
    JointChannel {
        joint,
        axis,
        channel,
        address,
    }
}

const JOINT_CHANNELS: [JointChannel; 11] = [
    joint(PoseLandmark::Nose, Axis::X, "body.nose.x", address::NOSE_X),
    joint(PoseLandmark::Nose, Axis::Y, "body.nose.y", address::NOSE_Y),
    joint(PoseLandmark::Nose, Axis::Z, "body.nose.z", address::NOSE_Z),
    joint(PoseLandmark::LeftShoulder, Axis::X, "body.shoulders.left.x", address::SHOULDER_LEFT_X),
    joint(PoseLandmark::LeftShoulder, Axis::Y, "body.shoulders.left.y", address::SHOULDER_LEFT_Y),
    joint(PoseLandmark::RightShoulder, Axis::X, "body.shoulders.right.x", address::SHOULDER_RIGHT_X),
    joint(PoseLandmark::RightShoulder, Axis::Y, "body.shoulders.right.y", address::SHOULDER_RIGHT_Y),
    joint(PoseLandmark::LeftWrist, Axis::X, "body.hands.left.x", address::HAND_LEFT_X),
    joint(PoseLandmark::LeftWrist, Axis::Y, "body.hands.left.y", address::HAND_LEFT_Y),
    joint(PoseLandmark::RightWrist, Axis::X, "body.hands.right.x", address::HAND_RIGHT_X),
    joint(PoseLandmark::RightWrist, Axis::Y, "body.hands.right.y", address::HAND_RIGHT_Y),
];

pub const CHANNEL_FACE_X: &str = "face.x";
pub const CHANNEL_FACE_Y: &str = "face.y";
pub const CHANNEL_FACE_Z: &str = "face.z";
pub const CHANNEL_BODY_DISTANCE: &str = "body.distance";

/// Frame-by-frame orchestration and the filter state it owns
#[derive(Debug, Clone)]
pub struct TrackingPipeline {
    mode: TrackingMode,
    filters: FilterBank,
    distance: DistanceSettings,
    reset_on_mode_change: bool,
    stats: FrameStats,
    stats_log_interval: u64,
}

impl TrackingPipeline {
    pub fn new(config: &PipelineConfig, filters: &FilterSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        let filters = FilterBank::new(filters.clone())?;

        Ok(Self {
            mode: config.initial_mode,
            filters,
            distance: DistanceSettings {
                visibility_threshold: config.visibility_threshold,
                min_visible_points: config.min_visible_points,
            },
            reset_on_mode_change: config.reset_on_mode_change,
            stats: FrameStats::new(),
            stats_log_interval: config.stats_log_interval,
        })
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Switch modes. Takes effect for the next processed frame.
    pub fn set_mode(&mut self, mode: TrackingMode) {
        if mode == self.mode {
            return;
        }

        if self.reset_on_mode_change {
            self.filters.reset_prefix(self.mode.channel_prefix());
        }

        tracing::info!("Tracking mode: {} -> {}", self.mode, mode);
        self.mode = mode;
    }

    /// Flip between face and body mode, returning the new mode
    pub fn toggle_mode(&mut self) -> TrackingMode {
        self.set_mode(self.mode.toggle());
        self.mode
    }

    /// Process one frame into telemetry records.
    ///
    /// An empty result means nothing was tracked this frame: no detection,
    /// no pose, or output from the inactive mode. No filter is updated in
    /// those cases.
    pub fn process(&mut self, frame: &Frame) -> Vec<TelemetryRecord> {
        self.record_stats(frame.timestamp);

        match (self.mode, &frame.output) {
            (TrackingMode::Face, DetectorOutput::Face(detections)) => {
                self.process_face(frame.timestamp, detections)
            }
            (TrackingMode::Body, DetectorOutput::Body(Some(pose))) => {
                self.process_body(frame.timestamp, frame.size, pose)
            }
            (TrackingMode::Body, DetectorOutput::Body(None)) => Vec::new(),
            (mode, output) => {
                tracing::trace!(
                    "Ignoring {} output in {} mode",
                    match output {
                        DetectorOutput::Face(_) => "face",
                        DetectorOutput::Body(_) => "body",
                    },
                    mode
                );
                Vec::new()
            }
        }
    }

    fn process_face(&mut self, timestamp: f64, detections: &[FaceDetection]) -> Vec<TelemetryRecord> {
        let Some(face) = selector::select_largest(detections) else {
            return Vec::new();
        };

        let m = metrics::face_metrics(&face.bbox);
        tracing::trace!(
            faces = detections.len(),
            area = face.bbox.area(),
            "Tracking largest face"
        );

        let mut records = Vec::with_capacity(3);
        self.push_filtered(&mut records, CHANNEL_FACE_X, address::FACE_X, m.x, timestamp);
        self.push_filtered(&mut records, CHANNEL_FACE_Y, address::FACE_Y, m.y, timestamp);
        self.push_filtered(&mut records, CHANNEL_FACE_Z, address::FACE_Z, m.z, timestamp);
        records
    }

    fn process_body(
        &mut self,
        timestamp: f64,
        size: FrameSize,
        pose: &PoseDetection,
    ) -> Vec<TelemetryRecord> {
        let mut records = Vec::with_capacity(JOINT_CHANNELS.len() + 1);

        match metrics::body_distance(pose, size, &self.distance) {
            Some(area) => self.push_filtered(
                &mut records,
                CHANNEL_BODY_DISTANCE,
                address::BODY_DISTANCE,
                area,
                timestamp,
            ),
            None => tracing::trace!("Body distance skipped: too few visible joints"),
        }

        for jc in &JOINT_CHANNELS {
            let Some(value) = pose.get(jc.joint).and_then(|point| jc.axis.of(point)) else {
                continue;
            };
            self.push_filtered(&mut records, jc.channel, jc.address, value, timestamp);
        }

        records
    }

    fn push_filtered(
        &mut self,
        records: &mut Vec<TelemetryRecord>,
        channel: &str,
        address: &'static str,
        raw: f64,
        timestamp: f64,
    ) {
        let value = self.filters.filter(channel, raw, timestamp);
        if value.is_finite() {
            records.push(TelemetryRecord::new(address, value));
        } else {
            tracing::debug!(channel, "Dropping non-finite value");
        }
    }

    fn record_stats(&mut self, timestamp: f64) {
        self.stats.record(timestamp);
        if self.stats_log_interval > 0 && self.stats.frames() % self.stats_log_interval == 0 {
            tracing::debug!(
                frames = self.stats.frames(),
                fps = self.stats.fps(),
                mode = %self.mode,
                "Pipeline stats"
            );
        }
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}
