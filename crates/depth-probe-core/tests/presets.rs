// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
use depth_probe_core::{ConfigError, DepthEncoding, PresetError, PresetService, ProbeConfig};
use depth_probe_dry_tests::InMemoryPresetStore;

fn sample() -> ProbeConfig {
    ProbeConfig {
        encoding: DepthEncoding::LogDepthViaFragmentDepth,
        near: 0.1,
        far: 1.0e5,
        param_c: 0.5,
        num_sample_points: 32,
        num_perturbed_trials: 8,
    }
}

#[test]
fn save_then_load_returns_the_same_config() {
    let store = InMemoryPresetStore::new();
    let service = PresetService::new(store.clone());
    service.save("wide", &sample()).unwrap();
    assert_eq!(service.load("wide").unwrap(), Some(sample()));

    let raw: serde_json::Value = serde_json::from_slice(&store.raw("wide").unwrap()).unwrap();
    assert_eq!(raw["encoding"], "logcf");
}

#[test]
fn missing_or_empty_presets_load_as_none() {
    let service = PresetService::new(InMemoryPresetStore::with_raw([("blank", "")]));
    assert_eq!(service.load("absent").unwrap(), None);
    assert_eq!(service.load("blank").unwrap(), None);
}

#[test]
fn invalid_configs_are_neither_saved_nor_loaded() {
    let store = InMemoryPresetStore::new();
    let service = PresetService::new(store.clone());
    let bad = ProbeConfig {
        num_perturbed_trials: 0,
        ..sample()
    };
    assert!(matches!(
        service.save("bad", &bad),
        Err(PresetError::Invalid(ConfigError::NoPerturbedTrials))
    ));
    assert_eq!(store.save_count(), 0);

    let stored = serde_json::to_vec(&bad).unwrap();
    let service = PresetService::new(InMemoryPresetStore::with_raw([("bad", stored)]));
    assert!(matches!(
        service.load("bad"),
        Err(PresetError::Invalid(ConfigError::NoPerturbedTrials))
    ));
}

#[test]
fn corrupt_blob_is_a_serde_error() {
    let service = PresetService::new(InMemoryPresetStore::with_raw([("x", "{not json")]));
    assert!(matches!(service.load("x"), Err(PresetError::Serde(_))));
}

#[test]
fn names_are_checked_before_touching_the_store() {
    let store = InMemoryPresetStore::new();
    let service = PresetService::new(store.clone());
    assert!(matches!(
        service.load("../escape"),
        Err(PresetError::InvalidName(_))
    ));
    assert!(matches!(
        service.save("", &sample()),
        Err(PresetError::InvalidName(_))
    ));
    assert_eq!((store.load_count(), store.save_count()), (0, 0));
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryPresetStore::new();
    let service = PresetService::new(store.clone());
    store.set_fail_on_load(true);
    assert!(matches!(service.load("any"), Err(PresetError::Other(_))));
}

#[test]
fn list_is_sorted() {
    let service = PresetService::new(InMemoryPresetStore::new());
    for name in ["zeta", "alpha", "mid"] {
        service.save(name, &sample()).unwrap();
    }
    assert_eq!(service.list().unwrap(), vec!["alpha", "mid", "zeta"]);
}
