use ndarray::ArrayView1;
use tracing::debug;

/// Default mean per-coordinate movement, in normalized image units.
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.05;

/// Admits a frame only if it moved enough since the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionGate {
    threshold: f64,
}

impl Default for MotionGate {
    fn default() -> Self {
        Self::new(DEFAULT_MOVEMENT_THRESHOLD)
    }
}

impl MotionGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True for the first observation, for a previous frame of a different
    /// length, or when the mean absolute coordinate difference exceeds the
    /// threshold. A non-finite difference also counts as movement, so frames
    /// with NaN or infinite coordinates reach validation instead of being
    /// dropped here.
    pub fn has_changed(&self, new: ArrayView1<f64>, previous: Option<ArrayView1<f64>>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        if new.len() != previous.len() {
            return true;
        }
        if new.is_empty() {
            return false;
        }
        let diff = mean_abs_diff(new, previous);
        let changed = !diff.is_finite() || diff > self.threshold;
        debug!(diff, threshold = self.threshold, changed, "motion gate");
        changed
    }
}

/// Mean of `|a[i] - b[i]|` over the shorter of the two vectors.
pub fn mean_abs_diff(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let total: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
    total / n as f64
}
