//! Measurement and normalization behaviour of the statevector engine.

use proptest::prelude::*;
use qrun_state::{StateEngine, Tableau};

fn bell(seed: u64) -> StateEngine {
    let mut engine = StateEngine::seeded(2, seed);
    engine.apply_h(0).unwrap();
    engine.apply_cnot(0, 1).unwrap();
    engine
}

// ---------------------------------------------------------------------------
// Collapse
// ---------------------------------------------------------------------------

#[test]
fn repeated_measurement_returns_same_bit() {
    for seed in 0..32 {
        let mut engine = StateEngine::seeded(3, seed);
        engine.apply_h(1).unwrap();
        engine.apply_ry(2, 0.9).unwrap();
        let first = engine.measure(1).unwrap();
        let second = engine.measure(1).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn measurement_renormalizes() {
    let mut engine = StateEngine::seeded(3, 11);
    engine.apply_h(0).unwrap();
    engine.apply_h(1).unwrap();
    engine.apply_cnot(1, 2).unwrap();
    engine.measure(0).unwrap();
    assert!((engine.norm_sqr() - 1.0).abs() < 1e-9);
    engine.measure_many(&[1, 2]).unwrap();
    assert!((engine.norm_sqr() - 1.0).abs() < 1e-9);
}

#[test]
fn seeded_engines_replay_outcomes() {
    let outcomes = |seed| {
        let mut engine = StateEngine::seeded(4, seed);
        (0..4).for_each(|q| engine.apply_h(q).unwrap());
        (0..4).map(|q| engine.measure(q).unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(outcomes(99), outcomes(99));
}

// ---------------------------------------------------------------------------
// Joint vs sequential measurement on a Bell pair
// ---------------------------------------------------------------------------

#[test]
fn joint_bell_measurement_is_00_or_11() {
    let mut zeros = 0;
    let trials = 400;
    for seed in 0..trials {
        let mut engine = bell(seed);
        let value = engine.measure_many(&[0, 1]).unwrap();
        assert!(value == 0 || value == 3, "unexpected outcome {value}");
        if value == 0 {
            zeros += 1;
            assert!((engine.amplitude(0).norm() - 1.0).abs() < 1e-9);
        } else {
            assert!((engine.amplitude(3).norm() - 1.0).abs() < 1e-9);
        }
    }
    // Both branches near 50 %.
    let fraction = f64::from(zeros) / trials as f64;
    assert!((0.35..0.65).contains(&fraction), "fraction of 00 = {fraction}");
}

#[test]
fn sequential_bell_measurement_is_correlated() {
    for seed in 0..64 {
        let mut engine = bell(seed);
        let m0 = engine.measure(0).unwrap();
        let m1 = engine.measure(1).unwrap();
        assert_eq!(m0, m1);
    }
}

#[test]
fn joint_measurement_bit_order_follows_argument_order() {
    let mut engine = StateEngine::seeded(3, 5);
    engine.apply_x(2).unwrap();
    // qubits [2, 0] → bit 0 is qubit 2, bit 1 is qubit 0
    assert_eq!(engine.measure_many(&[2, 0]).unwrap(), 0b01);
}

#[test]
fn sparse_measurement_matches_dense() {
    let mut dense = bell(21);
    let mut sparse = bell(21);
    sparse.compress();
    assert_eq!(
        dense.measure_many(&[0, 1]).unwrap(),
        sparse.measure_many(&[0, 1]).unwrap()
    );
}

#[test]
fn tableau_agrees_with_engine_on_deterministic_clifford_circuit() {
    let mut engine = StateEngine::seeded(3, 1);
    let mut tableau = Tableau::seeded(3, 1);

    engine.apply_h(0).unwrap();
    engine.apply_s(0).unwrap();
    engine.apply_s(0).unwrap();
    engine.apply_h(0).unwrap();
    engine.apply_cnot(0, 2).unwrap();
    engine.apply_swap(1, 2).unwrap();

    tableau.apply_h(0).unwrap();
    tableau.apply_s(0).unwrap();
    tableau.apply_s(0).unwrap();
    tableau.apply_h(0).unwrap();
    tableau.apply_cnot(0, 2).unwrap();
    tableau.apply_swap(1, 2).unwrap();

    for q in 0..3 {
        assert_eq!(engine.measure(q).unwrap(), tableau.measure(q).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Normalization under arbitrary unitary sequences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    H(usize),
    X(usize),
    Y(usize),
    Z(usize),
    S(usize),
    T(usize),
    Rx(usize, f64),
    Ry(usize, f64),
    Rz(usize, f64),
    Cnot(usize, usize),
    Cz(usize, usize),
    Ccnot(usize, usize, usize),
    Swap(usize, usize),
}

const N: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    let q = 0..N;
    prop_oneof![
        (0..6usize, q.clone()).prop_map(|(g, q)| match g {
            0 => Op::H(q),
            1 => Op::X(q),
            2 => Op::Y(q),
            3 => Op::Z(q),
            4 => Op::S(q),
            _ => Op::T(q),
        }),
        (0..3usize, q.clone(), -6.3f64..6.3).prop_map(|(g, q, a)| match g {
            0 => Op::Rx(q, a),
            1 => Op::Ry(q, a),
            _ => Op::Rz(q, a),
        }),
        (q.clone(), 1..N).prop_map(|(a, d)| Op::Cnot(a, (a + d) % N)),
        (q.clone(), 1..N).prop_map(|(a, d)| Op::Cz(a, (a + d) % N)),
        q.clone().prop_map(|a| Op::Ccnot(a, (a + 1) % N, (a + 2) % N)),
        (q, 1..N).prop_map(|(a, d)| Op::Swap(a, (a + d) % N)),
    ]
}

fn apply(engine: &mut StateEngine, op: &Op) {
    let result = match *op {
        Op::H(q) => engine.apply_h(q),
        Op::X(q) => engine.apply_x(q),
        Op::Y(q) => engine.apply_y(q),
        Op::Z(q) => engine.apply_z(q),
        Op::S(q) => engine.apply_s(q),
        Op::T(q) => engine.apply_t(q),
        Op::Rx(q, a) => engine.apply_rx(q, a),
        Op::Ry(q, a) => engine.apply_ry(q, a),
        Op::Rz(q, a) => engine.apply_rz(q, a),
        Op::Cnot(c, t) => engine.apply_cnot(c, t),
        Op::Cz(c, t) => engine.apply_cz(c, t),
        Op::Ccnot(a, b, t) => engine.apply_ccnot(a, b, t),
        Op::Swap(a, b) => engine.apply_swap(a, b),
    };
    result.unwrap();
}

proptest! {
    #[test]
    fn unitary_sequences_preserve_norm(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut dense = StateEngine::seeded(N, 0);
        let mut sparse = StateEngine::seeded(N, 0);
        sparse.compress();
        for op in &ops {
            apply(&mut dense, op);
            apply(&mut sparse, op);
        }
        prop_assert!((dense.norm_sqr() - 1.0).abs() < 1e-6);
        prop_assert!((sparse.norm_sqr() - 1.0).abs() < 1e-6);
        for i in 0..(1 << N) {
            prop_assert!((dense.amplitude(i) - sparse.amplitude(i)).norm() < 1e-9);
        }
    }
}
