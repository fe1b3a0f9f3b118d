//! Detector packet receiver
//!
//! The landmark detector runs out of process and sends one JSON datagram per
//! frame. Packets are tagged by `type`:
//!
//! ```json
//! {"type":"face","timestamp":1.5,"detections":[{"bbox":{"xmin":0.4,"ymin":0.3,"width":0.2,"height":0.2},"confidence":0.9}]}
//! {"type":"body","timestamp":1.5,"width":1280,"height":720,"landmarks":[{"x":0.5,"y":0.2,"z":-0.3,"visibility":0.98}]}
//! {"type":"mode","mode":"body"}
//! {"type":"toggle"}
//! ```
//!
//! `timestamp`, `width` and `height` are optional; missing timestamps are
//! filled with the receiver's own clock and missing sizes with the configured
//! frame size.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::UdpSocket;

use crate::config::InputConfig;
use crate::error::{LandmarkOscError, TrackingError};
use crate::tracking::landmarks::{
    DetectorOutput, FaceDetection, Frame, FrameSize, LandmarkPoint, PoseDetection,
};
use crate::tracking::pipeline::TrackingMode;

/// A single JSON packet from the detector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DetectorPacket {
    /// Face detector result: zero or more candidates
    Face {
        #[serde(default)]
        timestamp: Option<f64>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        detections: Vec<FaceDetection>,
    },
    /// Pose detector result: a skeleton, or nothing
    Body {
        #[serde(default)]
        timestamp: Option<f64>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        landmarks: Option<Vec<LandmarkPoint>>,
    },
    /// Switch to the given mode
    Mode { mode: TrackingMode },
    /// Flip the current mode
    Toggle,
}

/// What the processing loop should do with a packet
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorEvent {
    Frame(Frame),
    SetMode(TrackingMode),
    ToggleMode,
}

fn frame_size(width: Option<u32>, height: Option<u32>, default: FrameSize) -> FrameSize {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => FrameSize::new(w, h),
        _ => default,
    }
}

impl DetectorPacket {
    /// Resolve optional fields and turn the packet into an event.
    ///
    /// `now` is used when the packet carries no timestamp.
    pub fn into_event(self, now: f64, default_size: FrameSize) -> DetectorEvent {
        match self {
            DetectorPacket::Face {
                timestamp,
                width,
                height,
                detections,
            } => DetectorEvent::Frame(Frame::new(
                timestamp.unwrap_or(now),
                frame_size(width, height, default_size),
                DetectorOutput::Face(detections),
            )),
            DetectorPacket::Body {
                timestamp,
                width,
                height,
                landmarks,
            } => {
                let pose = landmarks
                    .filter(|points| !points.is_empty())
                    .map(PoseDetection::new);
                DetectorEvent::Frame(Frame::new(
                    timestamp.unwrap_or(now),
                    frame_size(width, height, default_size),
                    DetectorOutput::Body(pose),
                ))
            }
            DetectorPacket::Mode { mode } => DetectorEvent::SetMode(mode),
            DetectorPacket::Toggle => DetectorEvent::ToggleMode,
        }
    }
}

/// JSON-over-UDP detector receiver
pub struct DetectorReceiver {
    config: InputConfig,
    default_size: FrameSize,
    socket: Option<UdpSocket>,
    started: Instant,
    buf: Vec<u8>,
}

impl DetectorReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &InputConfig, default_size: FrameSize) -> Self {
        Self {
            config: config.clone(),
            default_size,
            socket: None,
            started: Instant::now(),
            buf: vec![0u8; config.max_packet_size.max(1)],
        }
    }

    /// Bind the UDP socket
    pub async fn start(&mut self) -> Result<(), LandmarkOscError> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).await.map_err(|e| {
            TrackingError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        tracing::info!("Detector receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Seconds since the receiver was created
    pub fn clock(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Decode one datagram
    pub fn parse(&self, data: &[u8]) -> Result<DetectorEvent, LandmarkOscError> {
        let packet: DetectorPacket = serde_json::from_slice(data)
            .map_err(|e| TrackingError::Parse(format!("JSON parse error: {}", e)))?;

        Ok(packet.into_event(self.clock(), self.default_size))
    }

    /// Wait for the next datagram and decode it
    pub async fn recv(&mut self) -> Result<DetectorEvent, LandmarkOscError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| TrackingError::Receiver("Receiver not started".to_string()))?;

        let size = socket
            .recv(&mut self.buf)
            .await
            .map_err(|e| TrackingError::Receiver(format!("Receive error: {}", e)))?;

        self.parse(&self.buf[..size])
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Detector receiver stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> DetectorReceiver {
        DetectorReceiver::new(&InputConfig::default(), FrameSize::new(640, 480))
    }

    fn frame(event: DetectorEvent) -> Frame {
        match event {
            DetectorEvent::Frame(frame) => frame,
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_face_packet() {
        let json = serde_json::json!({
            "type": "face",
            "timestamp": 12.5,
            "width": 1280,
            "height": 720,
            "detections": [
                {"bbox": {"xmin": 0.4, "ymin": 0.3, "width": 0.2, "height": 0.2}, "confidence": 0.93},
                {"bbox": {"xmin": 0.1, "ymin": 0.1, "width": 0.1, "height": 0.1}, "confidence": 0.71}
            ]
        })
        .to_string();

        let frame = frame(receiver().parse(json.as_bytes()).unwrap());
        assert_eq!(frame.timestamp, 12.5);
        assert_eq!(frame.size, FrameSize::new(1280, 720));
        match frame.output {
            DetectorOutput::Face(detections) => {
                assert_eq!(detections.len(), 2);
                assert!((detections[0].bbox.xmin - 0.4).abs() < 1e-12);
                assert!((detections[1].confidence - 0.71).abs() < 1e-12);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_parse_face_defaults() {
        let rx = receiver();
        let frame = frame(rx.parse(br#"{"type":"face"}"#).unwrap());
        assert_eq!(frame.size, FrameSize::new(640, 480));
        assert!(frame.timestamp >= 0.0 && frame.timestamp <= rx.clock());
        assert_eq!(frame.output, DetectorOutput::Face(Vec::new()));
    }

    #[test]
    fn test_parse_body_packet() {
        let json = serde_json::json!({
            "type": "body",
            "timestamp": 3.0,
            "landmarks": [
                {"x": 0.5, "y": 0.2, "z": -0.3, "visibility": 0.99},
                {"x": 0.52, "y": 0.18, "visibility": 0.5}
            ]
        })
        .to_string();

        let frame = frame(receiver().parse(json.as_bytes()).unwrap());
        match frame.output {
            DetectorOutput::Body(Some(pose)) => {
                assert_eq!(pose.landmarks.len(), 2);
                assert_eq!(pose.landmarks[0].z, Some(-0.3));
                assert_eq!(pose.landmarks[1].z, None);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_parse_body_without_landmarks() {
        let rx = receiver();
        let frame_a = frame(rx.parse(br#"{"type":"body","timestamp":1.0}"#).unwrap());
        assert_eq!(frame_a.output, DetectorOutput::Body(None));

        let frame_b = frame(rx.parse(br#"{"type":"body","timestamp":1.0,"landmarks":[]}"#).unwrap());
        assert_eq!(frame_b.output, DetectorOutput::Body(None));
    }

    #[test]
    fn test_parse_mode_packets() {
        let rx = receiver();
        assert_eq!(
            rx.parse(br#"{"type":"mode","mode":"body"}"#).unwrap(),
            DetectorEvent::SetMode(TrackingMode::Body)
        );
        assert_eq!(
            rx.parse(br#"{"type":"toggle"}"#).unwrap(),
            DetectorEvent::ToggleMode
        );
    }

    #[test]
    fn test_parse_errors() {
        let rx = receiver();
        let bad_packets: [&[u8]; 4] = [
            b"not json",
            br#"{"type":"hands"}"#,
            br#"{"type":"mode","mode":"sideways"}"#,
            br#"{"type":"face","detections":[{"confidence":0.9}]}"#,
        ];
        for bad in bad_packets {
            let err = rx.parse(bad).unwrap_err();
            assert!(matches!(err, LandmarkOscError::Tracking(TrackingError::Parse(_))));
        }
    }

    #[test]
    fn test_zero_size_falls_back_to_default() {
        let frame = frame(
            receiver()
                .parse(br#"{"type":"face","width":0,"height":720}"#)
                .unwrap(),
        );
        assert_eq!(frame.size, FrameSize::new(640, 480));
    }

    #[tokio::test]
    async fn test_recv_over_udp() {
        let config = InputConfig {
            listen_address: "127.0.0.1".to_string(),
            port: 0,
            ..InputConfig::default()
        };
        let mut rx = DetectorReceiver::new(&config, FrameSize::default());
        assert!(rx.recv().await.is_err());

        rx.start().await.unwrap();
        let addr = rx.local_addr().unwrap();

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(br#"{"type":"mode","mode":"face"}"#, addr)
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, DetectorEvent::SetMode(TrackingMode::Face));

        rx.stop();
        assert!(rx.local_addr().is_none());
    }
}
