//! Error types for landmark-osc

use thiserror::Error;

/// Main error type for landmark-osc
#[derive(Error, Debug)]
pub enum LandmarkOscError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Detector ingest errors
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Detector receiver error: {0}")]
    Receiver(String),

    #[error("Detector packet parse error: {0}")]
    Parse(String),
}

/// Telemetry output errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("OSC socket error: {0}")]
    Socket(String),

    #[error("OSC encode error: {0}")]
    Encode(String),

    #[error("OSC send error: {0}")]
    Send(String),
}

/// Result type alias for landmark-osc operations
pub type Result<T> = std::result::Result<T, LandmarkOscError>;
