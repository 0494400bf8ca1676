// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory preset store fake for testing without filesystem I/O.

use depth_probe_core::{PresetError, PresetStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`PresetStore`].
///
/// Clones share state, so a test can hand one clone to a
/// [`PresetService`](depth_probe_core::PresetService) and inspect the other.
///
/// # Example
///
/// ```
/// use depth_probe_dry_tests::InMemoryPresetStore;
/// use depth_probe_core::{DepthEncoding, PresetService, ProbeConfig};
///
/// let store = InMemoryPresetStore::new();
/// let service = PresetService::new(store.clone());
/// let config = ProbeConfig {
///     encoding: DepthEncoding::Perspective,
///     near: 1.0,
///     far: 100.0,
///     param_c: 1.0,
///     num_sample_points: 8,
///     num_perturbed_trials: 2,
/// };
///
/// service.save("quick", &config).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert_eq!(service.load("quick").unwrap(), Some(config));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryPresetStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryPresetStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw blobs (need not be valid JSON).
    pub fn with_raw<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                ..Inner::default()
            })),
        }
    }

    /// Make subsequent loads fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_on_load = fail;
    }

    /// Make subsequent saves fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_on_save = fail;
    }

    /// `load_raw` attempts, including failed ones.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// `save_raw` attempts, including failed ones.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }

    /// Raw blob stored under `name`, if any.
    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .get(name)
            .cloned()
    }
}

impl PresetStore for InMemoryPresetStore {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, PresetError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(PresetError::Other("simulated load failure".into()));
        }
        inner.data.get(name).cloned().ok_or(PresetError::NotFound)
    }

    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), PresetError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(PresetError::Other("simulated save failure".into()));
        }
        inner.data.insert(name.to_owned(), data.to_vec());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, PresetError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_save_load() {
        let store = InMemoryPresetStore::new();
        store.save_raw("a", b"{}").unwrap();
        assert_eq!(store.load_raw("a").unwrap(), b"{}");
        assert_eq!((store.save_count(), store.load_count()), (1, 1));
    }

    #[test]
    fn missing_name_is_not_found() {
        let store = InMemoryPresetStore::new();
        assert!(matches!(store.load_raw("nope"), Err(PresetError::NotFound)));
    }

    #[test]
    fn failures_still_count_and_store_nothing() {
        let store = InMemoryPresetStore::new();
        store.set_fail_on_save(true);
        assert!(store.save_raw("a", b"x").is_err());
        assert_eq!(store.save_count(), 1);
        assert!(store.raw("a").is_none());

        store.set_fail_on_load(true);
        assert!(matches!(store.load_raw("a"), Err(PresetError::Other(_))));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryPresetStore::with_raw([("seed", "not json")]);
        let b = a.clone();
        b.save_raw("other", b"{}").unwrap();
        assert_eq!(a.list().unwrap(), vec!["other", "seed"]);
        assert_eq!(a.raw("seed").unwrap(), b"not json");
    }
}
