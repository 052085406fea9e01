use std::time::Duration;

use anyhow::{Context, Result};
use kickform::{
    FeedbackPipeline, FeedbackPolicy, FileStore, LoadOutcome, PipelineConfig, PipelineEvent,
    PoseSample,
};
use ndarray::Array1;
use tracing::{debug, info};

use crate::report;
use crate::script::ReplayEvent;

const TICK: Duration = Duration::from_secs(1);

/// The pipeline bound to a model store, driven by script time.
pub struct App {
    pipeline: FeedbackPipeline,
    store: FileStore,
    key: String,
    next_tick: Option<Duration>,
    output: Vec<String>,
}

impl App {
    pub fn new(config: &PipelineConfig, store: FileStore, seed: Option<u64>) -> Result<Self> {
        let feedback = match seed {
            Some(seed) => FeedbackPolicy::with_seed(seed),
            None => FeedbackPolicy::new(),
        };
        let pipeline = FeedbackPipeline::from_config(config, feedback)
            .context("failed to build the classifier")?;
        Ok(Self {
            pipeline,
            store,
            key: config.model_key.clone(),
            next_tick: None,
            output: Vec::new(),
        })
    }

    pub fn pipeline(&self) -> &FeedbackPipeline {
        &self.pipeline
    }

    /// Lines produced so far, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn load(&mut self) -> Result<LoadOutcome> {
        let outcome = self
            .pipeline
            .load(&self.store, &self.key)
            .with_context(|| format!("failed to read model {:?}", self.key))?;
        Ok(outcome)
    }

    pub fn save(&mut self) -> Result<()> {
        self.pipeline
            .save(&mut self.store, &self.key)
            .with_context(|| format!("failed to save model {:?}", self.key))
    }

    pub fn train(&mut self, samples: &[PoseSample]) -> Result<usize> {
        self.pipeline
            .train(samples)
            .context("dataset does not fit the model")
    }

    /// Feeds a script through the pipeline.
    ///
    /// Countdown ticks fire every second after a capture starts, before any
    /// event stamped at the same time. Ticks still pending after the last
    /// event are flushed so a trailing capture completes.
    pub fn replay(&mut self, events: &[ReplayEvent]) -> Result<()> {
        for event in events {
            let at = event.at();
            self.run_ticks_until(Some(at));
            match event {
                ReplayEvent::Frame {
                    landmarks,
                    features,
                    ..
                } => {
                    let emitted = match (landmarks, features) {
                        (Some(landmarks), _) => self.pipeline.on_landmarks(landmarks, at),
                        (None, Some(features)) => {
                            self.pipeline.on_frame(Array1::from(features.clone()), at)
                        }
                        (None, None) => {
                            debug!(?at, "frame without data");
                            None
                        }
                    };
                    if let Some(emitted) = emitted {
                        self.emit(at, &emitted);
                    }
                }
                ReplayEvent::Capture { phase, quality, .. } => {
                    let started = self.pipeline.start_capture(*phase, *quality);
                    self.next_tick = Some(at + TICK);
                    self.emit(at, &started);
                }
                ReplayEvent::Save { .. } => {
                    self.save()?;
                    self.push(format!("model saved under {:?}", self.key));
                }
                ReplayEvent::Load { .. } => {
                    let outcome = self.load()?;
                    self.push(describe_load(&outcome));
                }
            }
        }
        self.run_ticks_until(None);
        Ok(())
    }

    fn run_ticks_until(&mut self, limit: Option<Duration>) {
        while let Some(due) = self.next_tick {
            if limit.is_some_and(|limit| due > limit) {
                break;
            }
            let event = self.pipeline.tick();
            self.next_tick = self.pipeline.capture().map(|_| due + TICK);
            if let Some(event) = event {
                let committed = matches!(event, PipelineEvent::CaptureCommitted { .. });
                self.emit(due, &event);
                if committed {
                    self.push(report::render_progress(&self.pipeline));
                }
            }
        }
    }

    fn emit(&mut self, at: Duration, event: &PipelineEvent) {
        info!(?at, %event, "pipeline event");
        self.push(report::render_event(at, event));
    }

    fn push(&mut self, line: String) {
        println!("{line}");
        self.output.push(line);
    }
}

pub fn describe_load(outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { examples } => format!("loaded model with {examples} examples"),
        LoadOutcome::NotFound => "no saved model, starting empty".to_string(),
        LoadOutcome::Unusable(reason) => format!("saved model ignored: {reason}"),
    }
}
