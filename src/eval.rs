//! Offline evaluation against a recorded pose dataset.
//!
//! A dataset is a JSON array of `{"features": [..], "label": "stance_good"}`
//! samples. [`evaluate`] trains on the leading 80% in file order, classifies
//! the rest and reports accuracy alongside a confusion matrix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use k_nn::{KnnClassifier, KnnError};
use kickform_helpers::L2Dist;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::label::Label;

/// Share of a dataset used for training.
pub const TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] KnnError),
    #[error("the training split is empty")]
    EmptyTrainingSet,
    #[error("the test split is empty")]
    EmptyTestSet,
}

/// One recorded, labeled pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub features: Vec<f64>,
    pub label: Label,
}

impl PoseSample {
    pub fn feature_array(&self) -> Array1<f64> {
        Array1::from(self.features.clone())
    }
}

pub fn parse_dataset(json: &str) -> Result<Vec<PoseSample>, EvalError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<PoseSample>, EvalError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = parse_dataset(&json)?;
    info!(path = %path.display(), samples = samples.len(), "loaded dataset");
    Ok(samples)
}

/// Splits at `floor(len * fraction)`, keeping file order.
pub fn split(samples: &[PoseSample], fraction: f64) -> (&[PoseSample], &[PoseSample]) {
    let at = ((samples.len() as f64) * fraction.clamp(0.0, 1.0)).floor() as usize;
    samples.split_at(at.min(samples.len()))
}

/// Counts of predicted labels per actual label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    cells: BTreeMap<Label, BTreeMap<Label, usize>>,
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: Label, predicted: Label) {
        *self
            .cells
            .entry(actual)
            .or_default()
            .entry(predicted)
            .or_insert(0) += 1;
    }

    pub fn get(&self, actual: Label, predicted: Label) -> usize {
        self.cells
            .get(&actual)
            .and_then(|row| row.get(&predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Non-zero cells as `(actual, predicted, count)`, ordered by label.
    pub fn iter(&self) -> impl Iterator<Item = (Label, Label, usize)> + '_ {
        self.cells.iter().flat_map(|(actual, row)| {
            row.iter()
                .map(move |(predicted, count)| (*actual, *predicted, *count))
        })
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, _, count)| count).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub k: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub correct: usize,
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    /// Percentage of test samples classified correctly.
    pub fn accuracy(&self) -> f64 {
        if self.test_size == 0 {
            return 0.0;
        }
        self.correct as f64 / self.test_size as f64 * 100.0
    }
}

/// Learns every sample in order. Stops at the first invalid sample.
pub fn train(
    classifier: &mut KnnClassifier<Label, f64, L2Dist>,
    samples: &[PoseSample],
) -> Result<usize, KnnError> {
    for sample in samples {
        classifier.learn(sample.feature_array(), sample.label)?;
    }
    Ok(samples.len())
}

/// Trains a fresh `k`-NN model on the first 80% and tests on the rest.
pub fn evaluate(samples: &[PoseSample], k: usize) -> Result<Evaluation, EvalError> {
    let (training, testing) = split(samples, TRAIN_FRACTION);
    if training.is_empty() {
        return Err(EvalError::EmptyTrainingSet);
    }
    if testing.is_empty() {
        return Err(EvalError::EmptyTestSet);
    }

    let mut classifier = KnnClassifier::new(k, L2Dist)?;
    train(&mut classifier, training)?;

    let mut confusion = ConfusionMatrix::default();
    let mut correct = 0;
    for sample in testing {
        let predicted = classifier.classify(sample.feature_array().view())?;
        if predicted == sample.label {
            correct += 1;
        }
        confusion.record(sample.label, predicted);
    }

    let evaluation = Evaluation {
        k,
        train_size: training.len(),
        test_size: testing.len(),
        correct,
        confusion,
    };
    info!(
        k = k,
        train = evaluation.train_size,
        test = evaluation.test_size,
        accuracy = evaluation.accuracy(),
        "evaluation finished"
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{Phase, Quality};
    use approx::assert_abs_diff_eq;

    fn sample(x: f64, y: f64, label: &str) -> PoseSample {
        PoseSample {
            features: vec![x, y],
            label: label.parse().unwrap(),
        }
    }

    fn dataset() -> Vec<PoseSample> {
        vec![
            sample(0.0, 0.0, "stance_good"),
            sample(0.1, 0.0, "stance_good"),
            sample(5.0, 5.0, "stance_bad"),
            sample(5.1, 5.0, "stance_bad"),
            sample(9.0, 0.0, "kick_leg_good"),
            sample(9.1, 0.1, "kick_leg_good"),
            sample(0.0, 9.0, "plant_foot_bad"),
            sample(0.1, 9.1, "plant_foot_bad"),
            // Test split: the last two.
            sample(0.05, 0.05, "stance_good"),
            sample(8.9, 0.2, "stance_bad"),
        ]
    }

    #[test]
    fn test_split_keeps_order() {
        let data = dataset();
        let (train, test) = split(&data, TRAIN_FRACTION);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(test[0], data[8]);
    }

    #[test]
    fn test_evaluate_counts_hits_and_confusions() {
        let evaluation = evaluate(&dataset(), 1).unwrap();
        assert_eq!(evaluation.train_size, 8);
        assert_eq!(evaluation.test_size, 2);
        assert_eq!(evaluation.correct, 1);
        assert_abs_diff_eq!(evaluation.accuracy(), 50.0);

        let stance_good = Label::new(Phase::Stance, Quality::Good);
        let stance_bad = Label::new(Phase::Stance, Quality::Bad);
        let kick_good = Label::new(Phase::KickLeg, Quality::Good);
        assert_eq!(evaluation.confusion.get(stance_good, stance_good), 1);
        assert_eq!(evaluation.confusion.get(stance_bad, kick_good), 1);
        assert_eq!(evaluation.confusion.total(), 2);
    }

    #[test]
    fn test_evaluate_needs_both_splits() {
        assert!(matches!(evaluate(&[], 3), Err(EvalError::EmptyTrainingSet)));
        let one = vec![sample(0.0, 0.0, "stance_good")];
        // floor(1 * 0.8) = 0 training samples.
        assert!(matches!(evaluate(&one, 3), Err(EvalError::EmptyTrainingSet)));
        let four: Vec<_> = dataset().into_iter().take(4).collect();
        // floor(4 * 0.8) = 3, one left for testing.
        assert!(evaluate(&four, 3).is_ok());
    }

    #[test]
    fn test_parse_dataset() {
        let json = r#"[{"features": [0.1, 0.2], "label": "plant_foot_good"}]"#;
        let samples = parse_dataset(json).unwrap();
        assert_eq!(samples[0].label, Label::new(Phase::PlantFoot, Quality::Good));
        assert!(parse_dataset(r#"[{"features": [0.1], "label": "bogus"}]"#).is_err());
    }
}
