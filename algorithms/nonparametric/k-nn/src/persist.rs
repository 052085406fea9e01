use serde::{Deserialize, Serialize};

/// The persisted form of a [`KnnClassifier`](crate::KnnClassifier).
///
/// Serializes as `{"k": .., "training": [{"point": [..], "label": ..}], "maxDist": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel<L, F> {
    pub k: usize,
    pub training: Vec<SavedExample<L, F>>,
    #[serde(rename = "maxDist")]
    pub max_dist: F,
}

/// One stored training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedExample<L, F> {
    pub point: Vec<F>,
    pub label: L,
}
