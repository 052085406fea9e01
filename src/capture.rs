use ndarray::{Array1, ArrayView1};

use crate::label::Label;

/// Default countdown before a guided capture commits, in seconds.
pub const DEFAULT_CAPTURE_DELAY_SECONDS: u32 = 5;

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTick {
    /// Still counting down.
    Counting { remaining: u32 },
    /// The countdown reached zero. Carries the last observed frame, if any.
    Finished(Option<Array1<f64>>),
}

/// A guided, countdown-timed capture of one training example.
///
/// While the countdown runs every incoming frame replaces the pending sample;
/// when it reaches zero the last one seen is handed back for learning.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSession {
    label: Label,
    remaining_seconds: u32,
    last_observed: Option<Array1<f64>>,
}

impl CaptureSession {
    pub fn new(label: Label, delay_seconds: u32) -> Self {
        Self {
            label,
            remaining_seconds: delay_seconds,
            last_observed: None,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn last_observed(&self) -> Option<ArrayView1<'_, f64>> {
        self.last_observed.as_ref().map(|v| v.view())
    }

    /// Replaces the pending sample.
    pub fn observe(&mut self, features: Array1<f64>) {
        self.last_observed = Some(features);
    }

    /// Advances the countdown by one second.
    ///
    /// Once `Finished` has been returned the pending sample is gone; the
    /// session should be dropped.
    pub fn tick(&mut self) -> CaptureTick {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            CaptureTick::Finished(self.last_observed.take())
        } else {
            CaptureTick::Counting {
                remaining: self.remaining_seconds,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{Phase, Quality};
    use ndarray::array;

    fn session(delay: u32) -> CaptureSession {
        CaptureSession::new(Label::new(Phase::KickLeg, Quality::Good), delay)
    }

    #[test]
    fn test_counts_down_then_finishes_with_last_frame() {
        let mut s = session(3);
        s.observe(array![0.1, 0.2]);
        assert_eq!(s.tick(), CaptureTick::Counting { remaining: 2 });
        s.observe(array![0.3, 0.4]);
        assert_eq!(s.tick(), CaptureTick::Counting { remaining: 1 });
        assert_eq!(s.tick(), CaptureTick::Finished(Some(array![0.3, 0.4])));
        assert_eq!(s.last_observed(), None);
    }

    #[test]
    fn test_finishes_empty_without_frames() {
        let mut s = session(1);
        assert_eq!(s.tick(), CaptureTick::Finished(None));
    }

    #[test]
    fn test_zero_delay_finishes_on_first_tick() {
        let mut s = session(0);
        s.observe(array![1.0]);
        assert_eq!(s.tick(), CaptureTick::Finished(Some(array![1.0])));
    }
}
