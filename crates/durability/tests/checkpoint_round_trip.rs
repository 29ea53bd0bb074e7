//! Checkpoint round-trip and recovery tests

use duelrank_core::{Error, SparseVector, WeightVector};
use duelrank_durability::CheckpointStore;
use proptest::prelude::*;
use tempfile::TempDir;

fn store(dir: &TempDir) -> CheckpointStore {
    CheckpointStore::open(dir.path().join("checkpoints"), "weight").unwrap()
}

#[test]
fn test_dump_then_load_same_epoch() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let w = WeightVector::from_vector(
        SparseVector::from_parts(1000, vec![3, 17, 999], vec![0.5, -1.0, 2.0e-7]).unwrap(),
        3,
    );

    store.dump(&w).unwrap();
    let loaded = store.load(3).unwrap();

    assert_eq!(loaded.vector().indices(), w.vector().indices());
    assert_eq!(loaded.vector().values(), w.vector().values());
    assert_eq!(loaded.dims(), 1000);
    assert_eq!(loaded.epoch(), 3);
}

#[test]
fn test_load_missing_epoch() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    assert!(matches!(
        store.load(9),
        Err(Error::CheckpointNotFound { epoch: 9 })
    ));
}

#[test]
fn test_list_and_latest() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    assert!(store.latest().unwrap().is_none());

    let weights: Vec<WeightVector> = [0u64, 10, 2]
        .iter()
        .map(|&epoch| {
            let w = WeightVector::from_vector(
                SparseVector::from_dense(&[epoch as f32, 0.0, 0.0, 1.0]),
                epoch,
            );
            store.dump(&w).unwrap();
            w
        })
        .collect();

    assert_eq!(store.list_epochs().unwrap(), vec![0, 2, 10]);
    assert_eq!(store.latest().unwrap().as_ref(), Some(&weights[1]));
}

#[test]
fn test_dump_overwrites_same_epoch() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store
        .dump(&WeightVector::from_vector(SparseVector::from_dense(&[1.0]), 1))
        .unwrap();
    let second = WeightVector::from_vector(SparseVector::from_dense(&[2.0]), 1);
    store.dump(&second).unwrap();

    assert_eq!(store.load(1).unwrap(), second);
    assert_eq!(store.list_epochs().unwrap(), vec![1]);
}

#[test]
fn test_corrupted_file_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let path = store
        .dump(&WeightVector::from_vector(SparseVector::from_dense(&[1.0, 2.0]), 5))
        .unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(store.load(5), Err(Error::Corruption(_))));
}

#[test]
fn test_renamed_file_epoch_mismatch_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let path = store
        .dump(&WeightVector::from_vector(SparseVector::from_dense(&[1.0]), 2))
        .unwrap();
    std::fs::rename(&path, store.path_for(3)).unwrap();

    assert!(matches!(store.load(3), Err(Error::Corruption(_))));
}

#[test]
fn test_extended_weight_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let mut w = WeightVector::from_vector(SparseVector::from_dense(&[0.0, 4.0, 0.0]), 1);
    w.extend_dims(50).unwrap();
    store.dump(&w).unwrap();

    let loaded = store.load(1).unwrap();
    assert_eq!(loaded.dims(), 50);
    assert_eq!(loaded.vector().get(1), 4.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip_preserves_nonzeros(
        dense in prop::collection::vec(prop_oneof![3 => Just(0.0f32), 1 => -1.0e3f32..1.0e3], 1..200),
        epoch in 0u64..1_000,
    ) {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let w = WeightVector::from_vector(SparseVector::from_dense(&dense), epoch);

        store.dump(&w).unwrap();
        let loaded = store.load(epoch).unwrap();
        prop_assert_eq!(loaded, w);
    }
}
