use ndarray::{Array1, ArrayView1};
use crate::Float;
use std::fmt::Debug;

/// A single labeled feature vector, as stored in a training set.
///
/// L: The type of the label (e.g., String, a phase/quality pair).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    /// Number of feature dimensions.
    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// Returns the index of the first NaN or infinite entry, if any.
pub fn first_non_finite<F: Float>(features: ArrayView1<F>) -> Option<usize> {
    features.iter().position(|v| !v.is_finite())
}
