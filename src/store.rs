//! Key/value persistence for serialized models.
//!
//! The classifier only produces and consumes strings; where they live is up
//! to a [`ModelStore`]. [`MemoryStore`] keeps them in a map, [`FileStore`]
//! writes one `<key>.json` file per key into a directory.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use k_nn::{KnnClassifier, KnnError};
use kickform_helpers::{Distance, Float};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

/// Key the live model is stored under unless configured otherwise.
pub const DEFAULT_MODEL_KEY: &str = "free_kick_model";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
    #[error("store I/O failed for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Model(#[from] KnnError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A string key/value store.
pub trait ModelStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key under a directory, created on first write.
///
/// Keys are restricted to ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ModelStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io_err = |source: io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        // Write-then-rename so a crash never leaves a half-written model.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }
}

/// What a load attempt found in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The model was replaced with the stored one.
    Loaded { examples: usize },
    /// Nothing is stored under the key.
    NotFound,
    /// Something is stored but it is not a usable model; the classifier is unchanged.
    Unusable(String),
}

/// Serializes `classifier` and writes it under `key`.
pub fn save_model<L, F, D, S>(
    classifier: &KnnClassifier<L, F, D>,
    store: &mut S,
    key: &str,
) -> Result<(), PersistError>
where
    L: Clone + Eq + Hash + Debug + Serialize,
    F: Float + Serialize,
    D: Distance<F>,
    S: ModelStore + ?Sized,
{
    let serialized = classifier.save_model()?;
    store.set(key, &serialized)?;
    info!(key = %key, examples = classifier.len(), "saved model");
    Ok(())
}

/// Reads the model stored under `key` into `classifier`.
///
/// A stored value that fails to load is reported as
/// [`LoadOutcome::Unusable`] and leaves `classifier` untouched. Only store
/// failures are returned as errors.
pub fn load_model<L, F, D, S>(
    classifier: &mut KnnClassifier<L, F, D>,
    store: &S,
    key: &str,
) -> Result<LoadOutcome, StoreError>
where
    L: Clone + Eq + Hash + Debug + DeserializeOwned,
    F: Float + DeserializeOwned,
    D: Distance<F>,
    S: ModelStore + ?Sized,
{
    let Some(serialized) = store.get(key)? else {
        info!(key = %key, "no saved model found");
        return Ok(LoadOutcome::NotFound);
    };
    match classifier.load_model(&serialized) {
        Ok(()) => {
            info!(key = %key, examples = classifier.len(), "loaded model");
            Ok(LoadOutcome::Loaded {
                examples: classifier.len(),
            })
        }
        Err(err) => {
            warn!(key = %key, %err, "no usable saved model");
            Ok(LoadOutcome::Unusable(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kickform_helpers::L2Dist;
    use ndarray::array;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("kickform-{name}-{}-{nanos}", std::process::id()))
    }

    fn classifier() -> KnnClassifier<String, f64, L2Dist> {
        let mut c = KnnClassifier::new(3, L2Dist).unwrap();
        c.learn(array![0.0, 0.0], "a".to_string()).unwrap();
        c.learn(array![1.0, 1.0], "b".to_string()).unwrap();
        c
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = scratch_dir("roundtrip");
        let mut store = FileStore::new(&dir);
        assert_eq!(store.get("model").unwrap(), None);

        store.set("model", "{\"k\":1}").unwrap();
        assert_eq!(store.get("model").unwrap().as_deref(), Some("{\"k\":1}"));
        store.set("model", "second").unwrap();
        assert_eq!(store.get("model").unwrap().as_deref(), Some("second"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let mut store = FileStore::new(scratch_dir("keys"));
        assert!(matches!(store.get("../escape"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.set("", "v"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        save_model(&classifier(), &mut store, DEFAULT_MODEL_KEY).unwrap();

        let mut fresh: KnnClassifier<String, f64, L2Dist> = KnnClassifier::new(5, L2Dist).unwrap();
        let outcome = load_model(&mut fresh, &store, DEFAULT_MODEL_KEY).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { examples: 2 });
        assert_eq!(fresh.k(), 3);
    }

    #[test]
    fn test_missing_and_unusable_models() {
        let mut store = MemoryStore::new();
        let mut c = classifier();

        assert_eq!(load_model(&mut c, &store, "absent").unwrap(), LoadOutcome::NotFound);

        store.set("broken", "not json").unwrap();
        let outcome = load_model(&mut c, &store, "broken").unwrap();
        assert!(matches!(outcome, LoadOutcome::Unusable(_)));
        assert_eq!(c.len(), 2);
    }
}
