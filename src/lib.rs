//! landmark-osc - Landmark Tracking Telemetry Service
//!
//! Turns per-frame face/body landmarks from an external detector into
//! smoothed scalar telemetry:
//! - Largest-face position and depth proxy (`/face/position/*`)
//! - Body distance proxy plus raw joint positions (`/body/*`)
//! - One-Euro adaptive smoothing per channel
//! - OSC over UDP output

pub mod config;
pub mod error;
pub mod output;
pub mod tracking;

pub use config::Config;
pub use error::{LandmarkOscError, Result};
pub use output::{TelemetryRecord, TelemetrySink};
pub use tracking::pipeline::{TrackingMode, TrackingPipeline};

use tracking::receiver::DetectorEvent;

/// Apply one detector event: switch modes, or process a frame and emit its
/// telemetry. Returns the number of records sent.
pub fn handle_event<S: TelemetrySink + ?Sized>(
    pipeline: &mut TrackingPipeline,
    sink: &mut S,
    event: DetectorEvent,
) -> usize {
    match event {
        DetectorEvent::Frame(frame) => {
            let records = pipeline.process(&frame);
            sink.emit_all(&records)
        }
        DetectorEvent::SetMode(mode) => {
            pipeline.set_mode(mode);
            0
        }
        DetectorEvent::ToggleMode => {
            pipeline.toggle_mode();
            0
        }
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
