//! Benchmarks for gate kernels in both representations.
//!
//! Run with: cargo bench -p qrun-state

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qrun_state::StateEngine;

fn bench_dense_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_gates");

    for num_qubits in &[10usize, 14, 18] {
        group.bench_with_input(BenchmarkId::new("h_layer", num_qubits), num_qubits, |b, &n| {
            let mut engine = StateEngine::seeded(n, 0);
            b.iter(|| {
                for q in 0..n {
                    engine.apply_h(black_box(q)).unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("cnot_chain", num_qubits), num_qubits, |b, &n| {
            let mut engine = StateEngine::seeded(n, 0);
            engine.apply_h(0).unwrap();
            b.iter(|| {
                for q in 0..n - 1 {
                    engine.apply_cnot(black_box(q), black_box(q + 1)).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_sparse_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_gates");

    // GHZ preparation stays at two nonzero amplitudes.
    for num_qubits in &[10usize, 20, 28] {
        group.bench_with_input(BenchmarkId::new("ghz", num_qubits), num_qubits, |b, &n| {
            b.iter(|| {
                let mut engine = StateEngine::sparse_seeded(n, 0);
                engine.apply_h(0).unwrap();
                for q in 0..n - 1 {
                    engine.apply_cnot(black_box(q), black_box(q + 1)).unwrap();
                }
                engine.nnz()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dense_gates, bench_sparse_gates);
criterion_main!(benches);
