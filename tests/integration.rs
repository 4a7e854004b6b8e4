//! Scenario and cross-representation tests that exercise the public
//! `Machine` façades end to end, rather than individual kernels.

use tsetlin::machine::{DenseMachine, SparseMachine, StatelessMachine};
use tsetlin::state::DenseState;
use tsetlin::{Hyperparams, OutputMode};

fn s1_hp() -> Hyperparams {
    Hyperparams::new(1, 1, 3, 100, 127, -127, false, 10.0).unwrap()
}

#[test]
fn s1_fixed_clause_inference_argmax_and_binary_vector() {
    let hp = s1_hp();
    let mut m = DenseMachine::create(hp, OutputMode::BinaryVector, 42).unwrap();
    m.set_state(DenseState::from_flat(&hp, &[1, -1, -1, 1, -1, -1]));
    m.set_weights(vec![1]);

    let mut out = [0u8; 1];
    m.predict(&[1, 0, 0], &mut out, 1).unwrap();
    assert_eq!(out, [1]);
    m.predict(&[1, 1, 0], &mut out, 1).unwrap();
    assert_eq!(out, [0]);
}

#[test]
fn s2_one_sample_training_reverses_prediction() {
    let hp = s1_hp();
    let mut m = DenseMachine::create(hp, OutputMode::BinaryVector, 42).unwrap();
    m.set_state(DenseState::from_flat(&hp, &[1, -1, -1, 1, -1, -1]));
    m.set_weights(vec![1]);

    let mut out = [0u8; 1];
    m.predict(&[1, 0, 1], &mut out, 1).unwrap();
    assert_eq!(out, [1]);

    m.train(&[1, 0, 1], &[0], 1, 10).unwrap();
    m.predict(&[1, 0, 1], &mut out, 1).unwrap();
    assert_eq!(out, [0]);
}

/// Dense and sparse clause evaluation must agree on the same logical state
/// and the same input row (spec.md §8, testable property 6).
#[test]
fn dense_and_sparse_clause_output_agree_on_same_state() {
    let hp = Hyperparams::new(2, 6, 4, 50, 127, -127, true, 3.0).unwrap();
    let mut dense = DenseMachine::create(hp, OutputMode::ClassIndex, 7).unwrap();

    let x_train: Vec<u8> = vec![
        1, 0, 1, 0, //
        0, 1, 0, 1, //
        1, 1, 0, 0, //
        0, 0, 1, 1, //
    ];
    let y_train: Vec<u8> = vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0];
    dense.train(&x_train, &y_train, 4, 20).unwrap();

    let path = std::env::temp_dir().join(format!("tsetlin_it_dense_{}.bin", std::process::id()));
    let path = path.to_str().unwrap();
    dense.save(path).unwrap();

    let sparse = SparseMachine::load(path, OutputMode::ClassIndex, Some(7)).unwrap();
    std::fs::remove_file(path).ok();

    for row in 0..4 {
        let x_row = &x_train[row * 4..(row + 1) * 4];
        for clause in 0..hp.num_clauses as usize {
            let dense_out = tsetlin::clause::evaluate_clause(dense.state_for_tests(), clause, x_row, true);
            let sparse_out = tsetlin::clause::evaluate_clause(sparse.state_for_tests(), clause, x_row, true);
            assert_eq!(dense_out, sparse_out, "clause {clause} row {row} disagreed");
        }
    }
}

/// Save a trained dense machine, load it as sparse, and as stateless; all
/// three must produce identical predictions on the same inputs.
#[test]
fn save_dense_load_sparse_and_stateless_round_trip_predictions() {
    let hp = Hyperparams::new(2, 8, 4, 50, 127, -127, false, 3.0).unwrap();
    let mut dense = DenseMachine::create(hp, OutputMode::ClassIndex, 11).unwrap();

    let x: Vec<u8> = vec![
        1, 0, 1, 0, //
        0, 1, 0, 1, //
        1, 1, 1, 1, //
        0, 0, 0, 0, //
    ];
    let y: Vec<u8> = vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0];
    dense.train(&x, &y, 4, 30).unwrap();

    let path = std::env::temp_dir().join(format!("tsetlin_it_roundtrip_{}.bin", std::process::id()));
    let path = path.to_str().unwrap();
    dense.save(path).unwrap();

    let sparse = SparseMachine::load(path, OutputMode::ClassIndex, Some(11)).unwrap();
    let stateless = StatelessMachine::load(path, OutputMode::ClassIndex).unwrap();
    std::fs::remove_file(path).ok();

    let mut dense_pred = vec![0u8; 4 * 4];
    let mut sparse_pred = vec![0u8; 4 * 4];
    let mut stateless_pred = vec![0u8; 4 * 4];
    dense.predict(&x, &mut dense_pred, 4).unwrap();
    sparse.predict(&x, &mut sparse_pred, 4).unwrap();
    stateless.predict(&x, &mut stateless_pred, 4).unwrap();

    assert_eq!(dense_pred, sparse_pred);
    assert_eq!(dense_pred, stateless_pred);
}

/// A stateless projection built directly from a trained sparse machine
/// (no save/load round trip) must predict identically to its source.
#[test]
fn stateless_from_sparse_matches_source_predictions() {
    let hp = Hyperparams::new(2, 6, 4, 50, 127, -127, false, 3.0).unwrap();
    let mut sparse = SparseMachine::create(hp, OutputMode::ClassIndex, 5).unwrap();

    let x: Vec<u8> = vec![1, 0, 1, 0, 0, 1, 0, 1];
    let y: Vec<u8> = vec![0, 0, 0, 0, 1, 0, 0, 0];
    sparse.train(&x, &y, 2, 15).unwrap();

    let stateless = StatelessMachine::from_sparse(&sparse);

    let mut sparse_pred = vec![0u8; 2 * 4];
    let mut stateless_pred = vec![0u8; 2 * 4];
    sparse.predict(&x, &mut sparse_pred, 2).unwrap();
    stateless.predict(&x, &mut stateless_pred, 2).unwrap();
    assert_eq!(sparse_pred, stateless_pred);
}

#[test]
fn evaluate_reports_match_count_and_ratio() {
    let hp = s1_hp();
    let mut m = DenseMachine::create(hp, OutputMode::BinaryVector, 42).unwrap();
    m.set_state(DenseState::from_flat(&hp, &[1, -1, -1, 1, -1, -1]));
    m.set_weights(vec![1]);

    let x: Vec<u8> = vec![1, 0, 0, 1, 1, 0];
    let y: Vec<u8> = vec![1, 0];
    let (matches, ratio) = m.evaluate(&x, &y, 2).unwrap();
    assert_eq!(matches, 2);
    assert!((ratio - 1.0).abs() < 1e-9);
}

