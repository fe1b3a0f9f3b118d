//! Rolling frame rate statistics

use std::collections::VecDeque;

/// Number of frames averaged for the reported rate
pub const FPS_WINDOW: usize = 30;

/// Average frame rate over the last `FPS_WINDOW` frames
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    last_timestamp: Option<f64>,
    rates: VecDeque<f64>,
    frames: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame processed at `timestamp` (seconds)
    pub fn record(&mut self, timestamp: f64) {
        self.frames += 1;

        if let Some(last) = self.last_timestamp {
            let dt = timestamp - last;
            if dt > 0.0 && dt.is_finite() {
                if self.rates.len() == FPS_WINDOW {
                    self.rates.pop_front();
                }
                self.rates.push_back(1.0 / dt);
            }
        }

        if timestamp.is_finite() {
            self.last_timestamp = Some(timestamp);
        }
    }

    /// Average frame rate, 0.0 until two frames have been seen
    pub fn fps(&self) -> f64 {
        if self.rates.is_empty() {
            return 0.0;
        }
        self.rates.iter().sum::<f64>() / self.rates.len() as f64
    }

    /// Total frames recorded
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let stats = FrameStats::new();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.frames(), 0);
    }

    #[test]
    fn test_steady_rate() {
        let mut stats = FrameStats::new();
        for i in 0..100 {
            stats.record(i as f64 / 30.0);
        }
        assert!((stats.fps() - 30.0).abs() < 1e-6);
        assert_eq!(stats.frames(), 100);
    }

    #[test]
    fn test_window_forgets_old_frames() {
        let mut stats = FrameStats::new();
        let mut t = 0.0;
        for _ in 0..50 {
            t += 0.1;
            stats.record(t);
        }
        for _ in 0..FPS_WINDOW {
            t += 0.02;
            stats.record(t);
        }
        assert!((stats.fps() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_timestamps_skipped() {
        let mut stats = FrameStats::new();
        stats.record(1.0);
        stats.record(1.0);
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.frames(), 2);
    }
}
