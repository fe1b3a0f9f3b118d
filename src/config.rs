//! Configuration parsing and management for landmark-osc

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, LandmarkOscError};
use crate::tracking::landmarks::FrameSize;
use crate::tracking::pipeline::TrackingMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub filters: FilterSettings,
    pub input: InputConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LandmarkOscError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, LandmarkOscError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, LandmarkOscError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LandmarkOscError> {
        self.pipeline.validate()?;
        self.filters.validate()?;

        if self.input.port == 0 {
            return Err(ConfigError::invalid("input.port", "Port must be greater than 0").into());
        }

        if self.output.port == 0 {
            return Err(ConfigError::invalid("output.port", "Port must be greater than 0").into());
        }

        if self.input.max_packet_size == 0 {
            return Err(ConfigError::invalid(
                "input.max_packet_size",
                "Packet buffer must be greater than 0",
            )
            .into());
        }

        Ok(())
    }
}

/// Per-frame orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mode on startup: "face" or "body"
    pub initial_mode: TrackingMode,
    /// Frame width used when a packet does not carry its own
    pub frame_width: u32,
    /// Frame height used when a packet does not carry its own
    pub frame_height: u32,
    /// Minimum visibility for a joint to count towards the body distance box
    pub visibility_threshold: f64,
    /// Minimum number of visible key joints for a body distance estimate
    pub min_visible_points: usize,
    /// Drop the filter state of the mode being left on every mode switch
    pub reset_on_mode_change: bool,
    /// Log frame rate every N processed frames (0 disables)
    pub stats_log_interval: u64,
}

/// Default visibility threshold for body distance extraction
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.7;

/// Default minimum number of visible key joints
pub const DEFAULT_MIN_VISIBLE_POINTS: usize = 4;

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_mode: TrackingMode::Face,
            frame_width: 640,
            frame_height: 480,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            min_visible_points: DEFAULT_MIN_VISIBLE_POINTS,
            reset_on_mode_change: false,
            stats_log_interval: 300,
        }
    }
}

impl PipelineConfig {
    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.frame_width, self.frame_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::invalid(
                "pipeline.frame_width/frame_height",
                "Frame dimensions must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::invalid(
                "pipeline.visibility_threshold",
                "Threshold must be between 0.0 and 1.0",
            ));
        }

        // Two points are the least that can span a box.
        if !(2..=5).contains(&self.min_visible_points) {
            return Err(ConfigError::invalid(
                "pipeline.min_visible_points",
                "Must be between 2 and 5 (the number of key joints)",
            ));
        }

        Ok(())
    }
}

/// One-Euro filter parameters for one channel (or a group of channels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Smooth this channel; when false the raw value is passed through
    pub enabled: bool,
    /// Expected sample rate in Hz. Only used as the fallback timestep.
    pub sampling_rate: f64,
    /// Cutoff frequency (Hz) applied to a static signal
    pub min_cutoff: f64,
    /// Speed coefficient: how fast the cutoff rises with signal speed
    pub beta: f64,
    /// Cutoff frequency (Hz) for the derivative estimate
    pub derivative_cutoff: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            enabled: true,
            sampling_rate: 120.0,
            min_cutoff: 0.4,
            beta: 0.4,
            derivative_cutoff: 1.0,
        }
    }
}

impl FilterParams {
    pub fn new(sampling_rate: f64, min_cutoff: f64, beta: f64) -> Self {
        Self {
            sampling_rate,
            min_cutoff,
            beta,
            ..Self::default()
        }
    }

    /// Passthrough parameters: the channel is never smoothed
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Timestep substituted when consecutive timestamps are degenerate
    pub fn default_timestep(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Check the parameters; `field` names the config entry in the error.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let positive = [
            ("sampling_rate", self.sampling_rate),
            ("min_cutoff", self.min_cutoff),
            ("derivative_cutoff", self.derivative_cutoff),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(
                    format!("{}.{}", field, name),
                    format!("Must be a finite value greater than 0 (got {})", value),
                ));
            }
        }

        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(ConfigError::invalid(
                format!("{}.beta", field),
                format!("Must be a finite, non-negative value (got {})", self.beta),
            ));
        }

        Ok(())
    }
}

/// Filter parameters for every channel.
///
/// `channels` is keyed by a dotted channel prefix. A channel such as
/// `body.nose.x` uses the longest matching key (`body.nose.x`, then
/// `body.nose`, then `body`) and falls back to `default`.
///
/// In TOML, fields left out of a channel table are taken from
/// `[filters.default]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FilterSettingsFile")]
pub struct FilterSettings {
    pub default: FilterParams,
    pub channels: HashMap<String, FilterParams>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettingsFile::default().into()
    }
}

/// A channel table as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ChannelOverride {
    enabled: Option<bool>,
    sampling_rate: Option<f64>,
    min_cutoff: Option<f64>,
    beta: Option<f64>,
    derivative_cutoff: Option<f64>,
}

impl ChannelOverride {
    fn tuned(min_cutoff: f64, beta: f64) -> Self {
        Self {
            min_cutoff: Some(min_cutoff),
            beta: Some(beta),
            ..Self::default()
        }
    }

    fn apply(&self, base: &FilterParams) -> FilterParams {
        FilterParams {
            enabled: self.enabled.unwrap_or(base.enabled),
            sampling_rate: self.sampling_rate.unwrap_or(base.sampling_rate),
            min_cutoff: self.min_cutoff.unwrap_or(base.min_cutoff),
            beta: self.beta.unwrap_or(base.beta),
            derivative_cutoff: self.derivative_cutoff.unwrap_or(base.derivative_cutoff),
        }
    }
}

/// `[filters]` section before channel tables are merged over the default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterSettingsFile {
    default: FilterParams,
    /// `None` keeps the built-in channel entries
    channels: Option<HashMap<String, ChannelOverride>>,
}

fn builtin_channels() -> HashMap<String, ChannelOverride> {
    let mut channels = HashMap::new();
    channels.insert("face".to_string(), ChannelOverride::tuned(0.4, 0.4));
    // Gentler smoothing for the pixel-area distance proxy
    channels.insert("body.distance".to_string(), ChannelOverride::tuned(0.1, 0.2));
    // Joint positions go out raw unless turned on
    channels.insert(
        "body".to_string(),
        ChannelOverride {
            enabled: Some(false),
            ..ChannelOverride::default()
        },
    );
    channels
}

impl From<FilterSettingsFile> for FilterSettings {
    fn from(file: FilterSettingsFile) -> Self {
        let channels = file
            .channels
            .unwrap_or_else(builtin_channels)
            .iter()
            .map(|(prefix, table)| (prefix.clone(), table.apply(&file.default)))
            .collect();

        Self {
            default: file.default,
            channels,
        }
    }
}

impl FilterSettings {
    /// Settings with no per-channel entries
    pub fn uniform(params: FilterParams) -> Self {
        Self {
            default: params,
            channels: HashMap::new(),
        }
    }

    /// Add or replace the parameters for a channel prefix
    pub fn with_channel(mut self, prefix: impl Into<String>, params: FilterParams) -> Self {
        self.channels.insert(prefix.into(), params);
        self
    }

    /// Resolve the parameters for a channel by longest dotted prefix
    pub fn resolve(&self, channel: &str) -> &FilterParams {
        let mut key = channel;
        loop {
            if let Some(params) = self.channels.get(key) {
                return params;
            }
            match key.rfind('.') {
                Some(idx) => key = &key[..idx],
                None => return &self.default,
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default.validate("filters.default")?;
        for (prefix, params) in &self.channels {
            params.validate(&format!("filters.channels.{}", prefix))?;
        }
        Ok(())
    }
}

/// Detector ingest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Listen address for the UDP socket
    pub listen_address: String,
    /// UDP port the detector helper sends packets to
    pub port: u16,
    /// Receive buffer size in bytes
    pub max_packet_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            port: 12346,
            max_packet_size: 65536,
        }
    }
}

/// OSC telemetry output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// OSC target host
    pub host: String,
    /// OSC target port
    pub port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5005,
        }
    }
}

impl OutputConfig {
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("landmark-osc");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/landmark-osc");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/landmark-osc");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("landmark-osc");
        }
    }

    PathBuf::from(".")
}
