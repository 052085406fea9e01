use std::time::Duration;

/// Default minimum time between two emitted classifications.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(500);

/// Rate-limits and de-duplicates emitted labels.
///
/// Timestamps are monotonic offsets from the start of the stream. Before the
/// first emission the interval check always passes.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalDebouncer<L> {
    interval: Duration,
    last_label: Option<L>,
    last_emission: Option<Duration>,
}

impl<L> Default for TemporalDebouncer<L> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_INTERVAL)
    }
}

impl<L> TemporalDebouncer<L> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_label: None,
            last_emission: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_label(&self) -> Option<&L> {
        self.last_label.as_ref()
    }

    pub fn last_emission(&self) -> Option<Duration> {
        self.last_emission
    }

    /// True if strictly more than the interval has passed since the last emission.
    pub fn interval_elapsed(&self, now: Duration) -> bool {
        match self.last_emission {
            None => true,
            Some(last) => now.saturating_sub(last) > self.interval,
        }
    }

    /// Records an emitted label.
    pub fn record(&mut self, label: L, now: Duration) {
        self.last_label = Some(label);
        self.last_emission = Some(now);
    }

    /// Restarts the interval without changing the last label.
    pub fn touch(&mut self, now: Duration) {
        self.last_emission = Some(now);
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        self.last_label = None;
        self.last_emission = None;
    }
}

impl<L: PartialEq> TemporalDebouncer<L> {
    /// True iff `candidate` differs from the last emitted label and the
    /// interval has elapsed. Callers follow a `true` with [`record`](Self::record).
    pub fn should_emit(&self, candidate: &L, now: Duration) -> bool {
        self.last_label.as_ref() != Some(candidate) && self.interval_elapsed(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_first_emission_is_allowed() {
        let debouncer: TemporalDebouncer<&str> = TemporalDebouncer::default();
        assert!(debouncer.should_emit(&"stance_good", ms(0)));
    }

    #[test]
    fn test_same_label_is_suppressed() {
        let mut debouncer = TemporalDebouncer::default();
        assert!(debouncer.should_emit(&"a", ms(1000)));
        debouncer.record("a", ms(1000));

        assert!(!debouncer.should_emit(&"a", ms(1200)));
        // The same label stays suppressed even after the window.
        assert!(!debouncer.should_emit(&"a", ms(5000)));
    }

    #[test]
    fn test_new_label_waits_for_window() {
        let mut debouncer = TemporalDebouncer::new(ms(500));
        debouncer.record("a", ms(1000));

        assert!(!debouncer.should_emit(&"b", ms(1300)));
        // Exactly the interval is not enough.
        assert!(!debouncer.should_emit(&"b", ms(1500)));
        assert!(debouncer.should_emit(&"b", ms(1501)));
    }

    #[test]
    fn test_touch_restarts_window_only() {
        let mut debouncer = TemporalDebouncer::new(ms(500));
        debouncer.record("a", ms(0));
        debouncer.touch(ms(2000));

        assert_eq!(debouncer.last_label(), Some(&"a"));
        assert!(!debouncer.interval_elapsed(ms(2400)));
        assert!(debouncer.interval_elapsed(ms(2600)));
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut debouncer = TemporalDebouncer::new(ms(500));
        debouncer.record("a", ms(1000));
        debouncer.reset();

        assert_eq!(debouncer.last_label(), None);
        assert_eq!(debouncer.last_emission(), None);
        assert!(debouncer.should_emit(&"a", ms(1001)));
    }
}
