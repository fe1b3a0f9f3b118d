//! OSC telemetry emitter
//!
//! Sends each record as its own OSC message with a single float32 argument.
//! Delivery is best effort: UDP, no acknowledgement, no retry.

use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::config::OutputConfig;
use crate::error::{LandmarkOscError, OutputError};
use crate::output::{TelemetryRecord, TelemetrySink};

/// Encode a record as an OSC packet
pub fn encode_record(record: &TelemetryRecord) -> Result<Vec<u8>, LandmarkOscError> {
    let packet = OscPacket::Message(OscMessage {
        addr: record.address.to_string(),
        args: vec![OscType::Float(record.value as f32)],
    });

    encoder::encode(&packet).map_err(|e| OutputError::Encode(format!("{:?}", e)).into())
}

/// UDP OSC client
pub struct OscEmitter {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscEmitter {
    /// Bind an ephemeral local socket and resolve the target address
    pub fn new(config: &OutputConfig) -> Result<Self, LandmarkOscError> {
        let target_str = config.target();
        let target = target_str
            .to_socket_addrs()
            .map_err(|e| OutputError::Socket(format!("Failed to resolve {}: {}", target_str, e)))?
            .next()
            .ok_or_else(|| OutputError::Socket(format!("No address for {}", target_str)))?;

        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| OutputError::Socket(format!("Failed to bind {}: {}", bind_addr, e)))?;

        tracing::info!("OSC telemetry target: {}", target);

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl TelemetrySink for OscEmitter {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<(), LandmarkOscError> {
        let data = encode_record(record)?;
        self.socket
            .send_to(&data, self.target)
            .map_err(|e| OutputError::Send(format!("{}: {}", self.target, e)))?;
        tracing::trace!("OSC {} {:.4}", record.address, record.value);
        Ok(())
    }
}
