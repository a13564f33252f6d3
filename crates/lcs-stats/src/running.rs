//! Incrementally updated averages.
//!
//! - [`RunningMean`] is the Widrow-Hoff delta rule `v += rate * (x - v)`, the
//!   same update the engine applies to classifier error and fitness.
//! - [`WindowedMean`] accumulates samples and yields their mean once per window,
//!   e.g. a performance line every `perf_trials` trials.

/// Exponential moving average updated with a fixed learning rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningMean {
    rate: f64,
    value: f64,
}

impl RunningMean {
    /// Creates a running mean starting at zero.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is outside `(0, 1]`.
    #[must_use]
    pub fn new(rate: f64) -> Self {
        assert!(rate > 0.0 && rate <= 1.0, "rate must be in (0, 1]");
        Self { rate, value: 0.0 }
    }

    /// Moves the average towards `sample`.
    pub fn push(&mut self, sample: f64) {
        self.value += self.rate * (sample - self.value);
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Sum of samples over a fixed-size window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedMean {
    window: usize,
    count: usize,
    total: f64,
}

impl WindowedMean {
    /// # Panics
    ///
    /// Panics if `window` is zero.
    #[must_use]
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "window must be non-zero");
        Self {
            window,
            count: 0,
            total: 0.0,
        }
    }

    /// Adds a sample. Returns the window mean and resets when the window is full.
    #[expect(clippy::cast_precision_loss)]
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        self.total += sample;
        self.count += 1;
        if self.count < self.window {
            return None;
        }
        let mean = self.total / self.count as f64;
        self.count = 0;
        self.total = 0.0;
        Some(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_mean_converges() {
        let mut mean = RunningMean::new(0.1);
        for _ in 0..500 {
            mean.push(2.0);
        }
        assert!((mean.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_running_mean_rate_one_tracks_last_sample() {
        let mut mean = RunningMean::new(1.0);
        mean.push(3.0);
        mean.push(-1.0);
        assert_eq!(mean.value(), -1.0);
    }

    #[test]
    fn test_windowed_mean_reports_once_per_window() {
        let mut window = WindowedMean::new(3);
        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(2.0), None);
        assert_eq!(window.push(3.0), Some(2.0));
        assert_eq!(window.push(6.0), None);
        assert_eq!(window.push(6.0), None);
        assert_eq!(window.push(6.0), Some(6.0));
    }
}
