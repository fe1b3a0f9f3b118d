//! Output module
//!
//! Telemetry records and the sinks that forward them:
//! - OSC over UDP (`osc::OscEmitter`)
//!
//! Consumers receive one scalar per message with no grouping, so the three
//! face position channels may land separately.

pub mod osc;

use crate::error::Result;

pub use osc::OscEmitter;

/// Fixed OSC address scheme. Consumers depend on these paths.
pub mod address {
    pub const FACE_X: &str = "/face/position/x";
    pub const FACE_Y: &str = "/face/position/y";
    /// Unitless depth proxy (`2.0 - box area`), not a distance
    pub const FACE_Z: &str = "/face/position/z";

    /// Raw pixel area of the head/torso box, not a distance
    pub const BODY_DISTANCE: &str = "/body/distance";

    pub const NOSE_X: &str = "/body/nose/x";
    pub const NOSE_Y: &str = "/body/nose/y";
    pub const NOSE_Z: &str = "/body/nose/z";

    pub const SHOULDER_LEFT_X: &str = "/body/shoulders/left/x";
    pub const SHOULDER_LEFT_Y: &str = "/body/shoulders/left/y";
    pub const SHOULDER_RIGHT_X: &str = "/body/shoulders/right/x";
    pub const SHOULDER_RIGHT_Y: &str = "/body/shoulders/right/y";

    pub const HAND_LEFT_X: &str = "/body/hands/left/x";
    pub const HAND_LEFT_Y: &str = "/body/hands/left/y";
    pub const HAND_RIGHT_X: &str = "/body/hands/right/x";
    pub const HAND_RIGHT_Y: &str = "/body/hands/right/y";
}

/// One scalar telemetry value addressed by an OSC path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub address: &'static str,
    pub value: f64,
}

impl TelemetryRecord {
    pub fn new(address: &'static str, value: f64) -> Self {
        Self { address, value }
    }
}

/// Destination for telemetry records
pub trait TelemetrySink {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<()>;

    /// Emit every record, logging failures instead of stopping.
    ///
    /// Returns the number of records sent.
    fn emit_all(&mut self, records: &[TelemetryRecord]) -> usize {
        let mut sent = 0;
        for record in records {
            match self.emit(record) {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!("Dropped telemetry {}: {}", record.address, e),
            }
        }
        sent
    }
}

/// Collects records in memory
impl TelemetrySink for Vec<TelemetryRecord> {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}
