//! The real-time feedback loop.
//!
//! [`FeedbackPipeline`] is driven by two kinds of input: pose frames from the
//! external pose source, and one-second countdown ticks while a guided capture
//! is running. Both take `&mut self`, so frames and ticks never interleave.
//! A host that delivers them from different threads wraps the pipeline in a
//! mutex.
//!
//! ```text
//! Observing --start_capture--> Capturing --tick reaches 0--> Observing
//!     ^                            |
//!     +-------start_capture--------+  (previous session discarded)
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use k_nn::{KnnClassifier, KnnError};
use kickform_helpers::L2Dist;
use ndarray::{Array1, ArrayView1};
use tracing::{debug, info, warn};

use crate::capture::{CaptureSession, CaptureTick};
use crate::config::PipelineConfig;
use crate::counters::{PhaseCounters, QualityCounts};
use crate::debounce::TemporalDebouncer;
use crate::eval::{self, PoseSample};
use crate::feedback::{FeedbackPolicy, Tip};
use crate::gate::MotionGate;
use crate::label::{Label, Phase, Quality};
use crate::landmarks::{Landmark, flatten_xy};
use crate::store::{self, LoadOutcome, ModelStore, PersistError, StoreError};

/// The classifier used for live feedback.
pub type PoseClassifier = KnnClassifier<Label, f64, L2Dist>;

/// Something the sink should show.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A new classification, rendered as a tip.
    Feedback(Tip),
    /// A frame was classified against an empty model.
    TrainFirst,
    /// A frame could not be classified (wrong length, non-finite values).
    InvalidFrame(String),
    CaptureStarted { label: Label, seconds: u32 },
    CaptureCountdown { label: Label, remaining: u32 },
    /// The capture was learned; `examples` is the new training set size.
    CaptureCommitted {
        label: Label,
        examples: usize,
        counts: QualityCounts,
    },
    /// The countdown ended without any frame to learn from.
    CaptureDiscarded { label: Label },
    /// The captured frame was rejected by the classifier.
    CaptureFailed { label: Label, reason: String },
}

impl Display for PipelineEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineEvent::Feedback(tip) => write!(f, "{tip}"),
            PipelineEvent::TrainFirst => {
                write!(f, "Train a few examples of good and bad poses first.")
            }
            PipelineEvent::InvalidFrame(reason) => write!(f, "Skipped frame: {reason}"),
            PipelineEvent::CaptureStarted { label, seconds } => write!(
                f,
                "Take a {} {} position... {seconds} seconds",
                label.quality.as_str().to_uppercase(),
                label.phase.title()
            ),
            PipelineEvent::CaptureCountdown { label, remaining } => {
                write!(f, "Hold your {} pose... {remaining} seconds", label.phase.title())
            }
            PipelineEvent::CaptureCommitted { label, examples, .. } => write!(
                f,
                "Pose saved as {label} ({examples} examples). \
                 Pick a new pose to train or start practicing."
            ),
            PipelineEvent::CaptureDiscarded { label } => {
                write!(f, "No pose seen during the {label} capture, nothing saved.")
            }
            PipelineEvent::CaptureFailed { label, reason } => {
                write!(f, "Could not save the {label} capture: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Observing,
    Capturing,
}

/// Classifies live frames and runs guided captures.
#[derive(Debug, Clone)]
pub struct FeedbackPipeline {
    classifier: PoseClassifier,
    gate: MotionGate,
    debouncer: TemporalDebouncer<Label>,
    feedback: FeedbackPolicy,
    last_vector: Option<Array1<f64>>,
    capture: Option<CaptureSession>,
    counters: PhaseCounters,
    capture_delay_seconds: u32,
    progress_target: u32,
}

impl FeedbackPipeline {
    /// Wraps an existing classifier; `config.k` is not applied to it.
    pub fn new(
        classifier: PoseClassifier,
        config: &PipelineConfig,
        feedback: FeedbackPolicy,
    ) -> Self {
        Self {
            classifier,
            gate: MotionGate::new(config.movement_threshold),
            debouncer: TemporalDebouncer::new(config.debounce_interval()),
            feedback,
            last_vector: None,
            capture: None,
            counters: PhaseCounters::new(),
            capture_delay_seconds: config.capture_delay_seconds,
            progress_target: config.progress_target,
        }
    }

    /// Builds an empty `config.k`-NN classifier and wraps it.
    pub fn from_config(
        config: &PipelineConfig,
        feedback: FeedbackPolicy,
    ) -> Result<Self, KnnError> {
        let classifier = KnnClassifier::new(config.k, L2Dist)?;
        Ok(Self::new(classifier, config, feedback))
    }

    pub fn classifier(&self) -> &PoseClassifier {
        &self.classifier
    }

    pub fn counters(&self) -> &PhaseCounters {
        &self.counters
    }

    /// Captures of `phase` this session, as a percentage of the configured target.
    pub fn progress(&self, phase: Phase) -> f64 {
        self.counters.progress(phase, self.progress_target)
    }

    pub fn capture(&self) -> Option<&CaptureSession> {
        self.capture.as_ref()
    }

    pub fn state(&self) -> PipelineState {
        if self.capture.is_some() {
            PipelineState::Capturing
        } else {
            PipelineState::Observing
        }
    }

    /// Flattens a landmark frame and handles it like [`on_frame`](Self::on_frame).
    /// Frames without landmarks are ignored.
    pub fn on_landmarks(&mut self, landmarks: &[Landmark], now: Duration) -> Option<PipelineEvent> {
        if landmarks.is_empty() {
            return None;
        }
        self.on_frame(flatten_xy(landmarks), now)
    }

    /// Handles one feature vector observed at `now`.
    ///
    /// While capturing the vector only becomes the pending sample. Otherwise
    /// it is classified when it moved past the gate and the debounce interval
    /// has elapsed, and a tip is returned if the label differs from the last
    /// one shown. Classification errors become events; they never escape.
    pub fn on_frame(&mut self, features: Array1<f64>, now: Duration) -> Option<PipelineEvent> {
        if let Some(session) = self.capture.as_mut() {
            session.observe(features.clone());
            self.last_vector = Some(features);
            return None;
        }

        let changed = self
            .gate
            .has_changed(features.view(), self.last_vector.as_ref().map(|v| v.view()));
        let event = if changed && self.debouncer.interval_elapsed(now) {
            self.classify_frame(features.view(), now)
        } else {
            None
        };
        self.last_vector = Some(features);
        event
    }

    fn classify_frame(
        &mut self,
        features: ArrayView1<f64>,
        now: Duration,
    ) -> Option<PipelineEvent> {
        match self.classifier.classify(features) {
            Ok(label) => {
                if !self.debouncer.should_emit(&label, now) {
                    debug!(%label, "unchanged classification");
                    return None;
                }
                self.debouncer.record(label, now);
                debug!(%label, "emitting classification");
                Some(PipelineEvent::Feedback(self.feedback.render_tip(&label)))
            }
            Err(KnnError::EmptyModel) => {
                self.debouncer.touch(now);
                Some(PipelineEvent::TrainFirst)
            }
            Err(err) => {
                warn!(%err, "frame rejected by classifier");
                self.debouncer.touch(now);
                Some(PipelineEvent::InvalidFrame(err.to_string()))
            }
        }
    }

    /// Starts a guided capture for `(phase, quality)`, discarding any running one.
    pub fn start_capture(&mut self, phase: Phase, quality: Quality) -> PipelineEvent {
        let label = Label::new(phase, quality);
        let session = CaptureSession::new(label, self.capture_delay_seconds);
        if let Some(previous) = self.capture.replace(session) {
            info!(previous = %previous.label(), "capture superseded");
        }
        self.debouncer.reset();
        info!(%label, seconds = self.capture_delay_seconds, "capture started");
        PipelineEvent::CaptureStarted {
            label,
            seconds: self.capture_delay_seconds,
        }
    }

    /// Advances a running capture by one second. Returns `None` when idle.
    pub fn tick(&mut self) -> Option<PipelineEvent> {
        let session = self.capture.as_mut()?;
        let label = session.label();
        match session.tick() {
            CaptureTick::Counting { remaining } => {
                Some(PipelineEvent::CaptureCountdown { label, remaining })
            }
            CaptureTick::Finished(observed) => {
                self.capture = None;
                self.debouncer.reset();
                Some(self.commit(label, observed))
            }
        }
    }

    fn commit(&mut self, label: Label, observed: Option<Array1<f64>>) -> PipelineEvent {
        let Some(features) = observed else {
            info!(%label, "capture ended without a frame");
            return PipelineEvent::CaptureDiscarded { label };
        };
        match self.classifier.learn(features, label) {
            Ok(()) => {
                self.counters.increment(label);
                info!(%label, examples = self.classifier.len(), "capture committed");
                PipelineEvent::CaptureCommitted {
                    label,
                    examples: self.classifier.len(),
                    counts: self.counters.get(label.phase),
                }
            }
            Err(err) => {
                warn!(%label, %err, "capture rejected");
                PipelineEvent::CaptureFailed {
                    label,
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Learns recorded samples directly, bypassing capture and counters.
    pub fn train(&mut self, samples: &[PoseSample]) -> Result<usize, KnnError> {
        let learned = eval::train(&mut self.classifier, samples)?;
        info!(learned, examples = self.classifier.len(), "batch training finished");
        Ok(learned)
    }

    pub fn save<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
    ) -> Result<(), PersistError> {
        store::save_model(&self.classifier, store, key)
    }

    /// Loads the stored model; an unusable one leaves the classifier as it was.
    pub fn load<S: ModelStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
    ) -> Result<LoadOutcome, StoreError> {
        store::load_model(&mut self.classifier, store, key)
    }
}
