//! Real-time posture feedback from a stream of pose landmark frames.
//!
//! Frames are flattened into feature vectors and classified by an incremental
//! k-nearest-neighbor model into per-phase quality labels (`stance_good`,
//! `kick_leg_bad`, ...). A [`MotionGate`] and a [`TemporalDebouncer`] decide
//! when a new classification is worth showing, a [`CaptureSession`] turns the
//! live stream into new training examples, and a [`FeedbackPolicy`] turns
//! labels into coaching tips. [`FeedbackPipeline`] wires these together.

pub mod capture;
pub mod config;
pub mod counters;
pub mod debounce;
pub mod eval;
pub mod feedback;
pub mod gate;
pub mod label;
pub mod landmarks;
pub mod pipeline;
pub mod store;

pub use capture::{CaptureSession, CaptureTick};
pub use config::{ConfigError, PipelineConfig};
pub use counters::{PhaseCounters, QualityCounts};
pub use debounce::TemporalDebouncer;
pub use eval::{ConfusionMatrix, EvalError, Evaluation, PoseSample};
pub use feedback::{FeedbackPolicy, Tip};
pub use gate::MotionGate;
pub use label::{Label, LabelParseError, Phase, Quality};
pub use landmarks::{Landmark, flatten_xy};
pub use pipeline::{FeedbackPipeline, PipelineEvent, PipelineState, PoseClassifier};
pub use store::{FileStore, LoadOutcome, MemoryStore, ModelStore, PersistError, StoreError};

pub use k_nn::{KnnClassifier, KnnError};
pub use kickform_helpers::{DataPoint, Distance, L2Dist};
