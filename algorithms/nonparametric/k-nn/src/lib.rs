use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
// These are the core components from our shared library.
use kickform_helpers::{DataPoint, Distance, first_non_finite};

// ndarray and kickform_helpers are used in the public function signatures.
use kickform_helpers::Float;
use ndarray::{Array1, ArrayView1};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

mod persist;

pub use persist::{SavedExample, SavedModel};

/// Errors that can occur when using the k-NN classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnnError {
    /// k cannot be zero for a k-NN classifier
    #[error("k cannot be zero for a k-NN classifier")]
    InvalidK,
    /// Cannot classify before any example has been learned
    #[error("Cannot classify with an empty model")]
    EmptyModel,
    /// The vector length disagrees with the established dimensionality
    #[error("Vector must have {expected} dimensions, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// The vector contains a NaN or infinite entry
    #[error("Vector entry {index} is not a finite number")]
    InvalidValue { index: usize },
    /// Persisted model data could not be parsed or has the wrong shape
    #[error("Invalid model format: {0}")]
    InvalidFormat(String),
}

/// An incremental k-Nearest Neighbors (k-NN) classifier.
///
/// Examples are learned one at a time and kept in insertion order. A new
/// point is classified by a vote among the `k` stored examples closest to it.
///
/// The dimensionality of the feature space is fixed by the first learned
/// example; every later vector passed to [`learn`](Self::learn) or
/// [`classify`](Self::classify) must have the same length.
///
/// The classifier also maintains the largest distance between any two stored
/// examples. It is recomputed over all pairs after every `learn`, which costs
/// O(n²) in the number of examples.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, or a structured label type).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
/// * `D`: The distance metric, which must implement the `Distance` trait.
#[derive(Debug, Clone)]
pub struct KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    k: usize,
    training_data: Vec<DataPoint<L, F>>,
    max_dist: F,
    distance: D,
}

impl<L, F, D> KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    /// Creates a new, empty k-NN classifier.
    ///
    /// # Arguments
    ///
    /// * `k`: The number of neighbors to consider for classification. Must be greater than 0.
    /// * `distance`: An instance of a struct that implements the `Distance` trait (e.g., `L2Dist`).
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0, as this is not a valid configuration.
    pub fn new(k: usize, distance: D) -> Result<Self, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        Ok(Self {
            k,
            training_data: Vec::new(),
            max_dist: F::zero(),
            distance,
        })
    }

    /// Creates a classifier and learns every data point in order.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0, or the first validation error
    /// raised by [`learn`](Self::learn).
    pub fn with_training_data(
        k: usize,
        training_data: Vec<DataPoint<L, F>>,
        distance: D,
    ) -> Result<Self, KnnError> {
        let mut classifier = Self::new(k, distance)?;
        for dp in &training_data {
            classifier.check_input(dp.features.view())?;
            classifier.training_data.push(dp.clone());
        }
        classifier.max_dist =
            max_pairwise_distance(&classifier.training_data, &classifier.distance);
        Ok(classifier)
    }

    /// The number of neighbors that vote on a classification.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Changes the number of voting neighbors.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0; the current value is kept.
    pub fn set_k(&mut self, k: usize) -> Result<(), KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        self.k = k;
        Ok(())
    }

    /// Number of learned examples.
    pub fn len(&self) -> usize {
        self.training_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training_data.is_empty()
    }

    /// The established dimensionality, or `None` before the first example.
    pub fn dimension(&self) -> Option<usize> {
        self.training_data.first().map(DataPoint::dim)
    }

    /// The learned examples, in insertion order.
    pub fn examples(&self) -> &[DataPoint<L, F>] {
        &self.training_data
    }

    /// The largest Euclidean distance between any two learned examples
    /// (zero with fewer than two examples).
    pub fn max_pairwise_distance(&self) -> F {
        self.max_dist
    }

    /// Adds one labeled example to the training set.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::DimensionMismatch` if the vector length differs from
    /// the established dimensionality, and `KnnError::InvalidValue` if any entry
    /// is NaN or infinite. The training set is unchanged on error.
    pub fn learn(&mut self, features: Array1<F>, label: L) -> Result<(), KnnError> {
        self.check_input(features.view())?;
        self.training_data.push(DataPoint::new(features, label));
        self.max_dist = max_pairwise_distance(&self.training_data, &self.distance);
        debug!(
            examples = self.training_data.len(),
            max_dist = ?self.max_dist,
            "learned example"
        );
        Ok(())
    }

    /// Predicts the label for a new, unseen data point.
    ///
    /// Neighbors are ordered by ascending distance; exact ties keep insertion
    /// order. The vote scans the `k` nearest from closest to farthest and only
    /// hands the lead to a label whose count becomes strictly greater than the
    /// leader's, so on a tie the label that reached its final count first wins.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::DimensionMismatch` or `KnnError::InvalidValue` if the
    /// vector is invalid, and `KnnError::EmptyModel` if nothing has been learned.
    pub fn classify(&self, features: ArrayView1<F>) -> Result<L, KnnError> {
        self.check_input(features)?;
        if self.training_data.is_empty() {
            return Err(KnnError::EmptyModel);
        }

        // 1. Relative distance (squared Euclidean for L2) to every stored example.
        let mut distances: Vec<(F, &L)> = self
            .training_data
            .iter()
            .map(|dp| {
                let dist = self.distance.rdistance(dp.features.view(), features);
                (dist, &dp.label)
            })
            .collect();

        // 2. `sort_by` is stable, so equal distances stay in insertion order.
        //    Inputs are validated finite, so `partial_cmp` always succeeds.
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        // 3. Take the top `k` neighbors, or all of them if there are fewer.
        let num_neighbors = self.k.min(distances.len());
        let neighbors = &distances[..num_neighbors];

        // 4. Running vote, nearest first.
        let mut votes: HashMap<&L, usize> = HashMap::new();
        let mut winner: Option<(&L, usize)> = None;
        for &(_, label) in neighbors {
            let count = votes.entry(label).or_insert(0);
            *count += 1;
            if winner.is_none_or(|(_, best)| *count > best) {
                winner = Some((label, *count));
            }
        }

        winner
            .map(|(label, _)| label.clone())
            .ok_or(KnnError::EmptyModel)
    }

    /// Returns the persisted form of the classifier state.
    pub fn to_saved(&self) -> SavedModel<L, F> {
        SavedModel {
            k: self.k,
            training: self
                .training_data
                .iter()
                .map(|dp| SavedExample {
                    point: dp.features.to_vec(),
                    label: dp.label.clone(),
                })
                .collect(),
            max_dist: self.max_dist,
        }
    }

    /// Rebuilds a classifier from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidFormat` if `k` is zero, the points do not
    /// share one dimensionality, any coordinate is not finite, or `maxDist`
    /// is negative or not finite.
    pub fn from_saved(saved: SavedModel<L, F>, distance: D) -> Result<Self, KnnError> {
        if saved.k == 0 {
            return Err(KnnError::InvalidFormat("k must be a positive integer".into()));
        }
        if !saved.max_dist.is_finite() || saved.max_dist < F::zero() {
            return Err(KnnError::InvalidFormat(
                "maxDist must be a finite, non-negative number".into(),
            ));
        }

        let mut training_data = Vec::with_capacity(saved.training.len());
        for (i, example) in saved.training.into_iter().enumerate() {
            let features = Array1::from(example.point);
            if let Some(first) = training_data.first().map(DataPoint::<L, F>::dim) {
                if features.len() != first {
                    return Err(KnnError::InvalidFormat(format!(
                        "training example {i} has {} dimensions, expected {first}",
                        features.len()
                    )));
                }
            }
            if let Some(index) = first_non_finite(features.view()) {
                return Err(KnnError::InvalidFormat(format!(
                    "training example {i} has a non-finite value at index {index}"
                )));
            }
            training_data.push(DataPoint::new(features, example.label));
        }

        let max_dist = max_pairwise_distance(&training_data, &distance);
        let tolerance = F::cast(1e-6).unwrap_or_else(F::epsilon) * (F::one() + max_dist);
        let drift = if max_dist > saved.max_dist {
            max_dist - saved.max_dist
        } else {
            saved.max_dist - max_dist
        };
        if drift > tolerance {
            warn!(
                stored = ?saved.max_dist,
                recomputed = ?max_dist,
                "stored maxDist disagrees with the training set, using recomputed value"
            );
        }

        Ok(Self {
            k: saved.k,
            training_data,
            max_dist,
            distance,
        })
    }

    /// Serializes `{k, training, maxDist}` to JSON. Does not modify the classifier.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidFormat` if serialization fails.
    pub fn save_model(&self) -> Result<String, KnnError>
    where
        L: Serialize,
        F: Serialize,
    {
        serde_json::to_string(&self.to_saved()).map_err(|e| KnnError::InvalidFormat(e.to_string()))
    }

    /// Replaces the classifier state with a model produced by [`save_model`](Self::save_model).
    ///
    /// The state is only replaced when the whole input parses and validates;
    /// on error the classifier is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidFormat` on malformed JSON, missing fields, or
    /// a model that fails [`from_saved`](Self::from_saved) validation.
    pub fn load_model(&mut self, serialized: &str) -> Result<(), KnnError>
    where
        L: DeserializeOwned,
        F: DeserializeOwned,
    {
        let saved: SavedModel<L, F> =
            serde_json::from_str(serialized).map_err(|e| KnnError::InvalidFormat(e.to_string()))?;
        let restored = Self::from_saved(saved, self.distance.clone())?;
        *self = restored;
        debug!(examples = self.training_data.len(), k = self.k, "loaded model");
        Ok(())
    }

    fn check_input(&self, features: ArrayView1<F>) -> Result<(), KnnError> {
        if let Some(expected) = self.dimension() {
            if features.len() != expected {
                return Err(KnnError::DimensionMismatch {
                    expected,
                    found: features.len(),
                });
            }
        }
        if let Some(index) = first_non_finite(features) {
            return Err(KnnError::InvalidValue { index });
        }
        Ok(())
    }
}

/// Largest true distance between any two points, zero with fewer than two.
fn max_pairwise_distance<L, F, D>(data: &[DataPoint<L, F>], distance: &D) -> F
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    let mut max_rdist = F::zero();
    for (i, a) in data.iter().enumerate() {
        for b in &data[i + 1..] {
            let rdist = distance.rdistance(a.features.view(), b.features.view());
            if rdist > max_rdist {
                max_rdist = rdist;
            }
        }
    }
    distance.rdist_to_dist(max_rdist)
}
