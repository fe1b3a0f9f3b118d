//! One-Euro adaptive low-pass filtering
//!
//! `OneEuroFilter` smooths a single scalar stream: heavy smoothing while the
//! signal is still, lighter smoothing as it moves faster. `FilterBank` owns one
//! filter per named channel ("face.x", "body.distance", ...) and creates them
//! on first use.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::config::{FilterParams, FilterSettings};
use crate::error::ConfigError;

/// Stored state of one channel after its last sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// Last filtered value
    pub value: f64,
    /// Last smoothed derivative (units per second)
    pub derivative: f64,
    /// Latest timestamp seen (seconds); never decreases
    pub timestamp: f64,
}

/// Exponential smoothing factor for a first-order RC low-pass filter.
///
/// Always in (0, 1] for a positive `dt` and `cutoff`.
fn smoothing_factor(dt: f64, cutoff: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    (1.0 / (1.0 + tau / dt)).clamp(0.0, 1.0)
}

fn blend(alpha: f64, current: f64, previous: f64) -> f64 {
    alpha * current + (1.0 - alpha) * previous
}

/// Adaptive low-pass filter for one scalar channel
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: FilterParams,
    state: Option<FilterState>,
}

impl OneEuroFilter {
    /// Create a filter, rejecting invalid parameters
    pub fn new(params: FilterParams) -> Result<Self, ConfigError> {
        params.validate("filter")?;
        Ok(Self::from_validated(params))
    }

    fn from_validated(params: FilterParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    /// Filter one sample taken at `timestamp` (seconds).
    ///
    /// The first sample is returned unchanged. A timestamp that does not move
    /// forward is replaced by one nominal sample period. Non-finite samples
    /// leave the state untouched and yield the previous estimate.
    pub fn filter(&mut self, value: f64, timestamp: f64) -> f64 {
        let Some(prev) = self.state else {
            if value.is_finite() {
                self.state = Some(FilterState {
                    value,
                    derivative: 0.0,
                    timestamp,
                });
            }
            return value;
        };

        if !value.is_finite() {
            return prev.value;
        }

        let elapsed = timestamp - prev.timestamp;
        let dt = if elapsed.is_finite() && elapsed > 0.0 {
            elapsed
        } else {
            self.params.default_timestep()
        };

        let raw_derivative = (value - prev.value) / dt;
        let derivative = blend(
            smoothing_factor(dt, self.params.derivative_cutoff),
            raw_derivative,
            prev.derivative,
        );

        let cutoff = self.params.min_cutoff + self.params.beta * derivative.abs();
        let filtered = blend(smoothing_factor(dt, cutoff), value, prev.value);

        let timestamp = if timestamp.is_finite()
            && (timestamp > prev.timestamp || !prev.timestamp.is_finite())
        {
            timestamp
        } else {
            prev.timestamp
        };

        // A swing too large for f64 restarts the channel at the raw sample
        if !(derivative.is_finite() && filtered.is_finite()) {
            tracing::debug!(value, "Filter overflowed, restarting from raw sample");
            self.state = Some(FilterState {
                value,
                derivative: 0.0,
                timestamp,
            });
            return value;
        }

        self.state = Some(FilterState {
            value: filtered,
            derivative,
            timestamp,
        });

        filtered
    }

    /// Forget all history; the next sample passes through unchanged
    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn state(&self) -> Option<FilterState> {
        self.state
    }

}

/// Registry of per-channel filters, keyed by channel name
#[derive(Debug, Clone)]
pub struct FilterBank {
    settings: FilterSettings,
    channels: HashMap<String, OneEuroFilter>,
}

impl FilterBank {
    /// Build an empty bank. Every parameter set is validated here so that
    /// channels can be created lazily without failing later.
    pub fn new(settings: FilterSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            channels: HashMap::new(),
        })
    }

    /// Filter `value` on `channel`, creating the channel on first use.
    ///
    /// Channels whose parameters are disabled pass the value through and keep
    /// no state.
    pub fn filter(&mut self, channel: &str, value: f64, timestamp: f64) -> f64 {
        let params = self.settings.resolve(channel);
        if !params.enabled {
            return value;
        }

        if let Some(filter) = self.channels.get_mut(channel) {
            return filter.filter(value, timestamp);
        }

        tracing::debug!(channel, min_cutoff = params.min_cutoff, beta = params.beta, "New filter channel");
        let mut filter = OneEuroFilter::from_validated(params.clone());
        let out = filter.filter(value, timestamp);
        self.channels.insert(channel.to_string(), filter);
        out
    }

    /// Drop the state of every channel named `prefix` or under `prefix.`
    pub fn reset_prefix(&mut self, prefix: &str) {
        let before = self.channels.len();
        self.channels.retain(|key, _| {
            !(key == prefix
                || (key.starts_with(prefix) && key[prefix.len()..].starts_with('.')))
        });
        tracing::debug!(prefix, dropped = before - self.channels.len(), "Reset filter channels");
    }

    /// Drop every channel
    pub fn reset(&mut self) {
        self.channels.clear();
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn state(&self, channel: &str) -> Option<FilterState> {
        self.channels.get(channel).and_then(OneEuroFilter::state)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
