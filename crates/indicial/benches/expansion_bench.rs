//! Benchmarks for equation expansion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use indicial::prelude::*;

const NAVIER_STOKES_MOMENTUM: &str =
    "Eq(Der(rhou_i, t), -Conservative(rhou_i*u_j + p*KD(i, j), x_j) + Der(tau_i_j, x_j))";

fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");

    for ndim in [1usize, 2, 3] {
        group.bench_with_input(
            BenchmarkId::new("momentum", ndim),
            &ndim,
            |b, &ndim| {
                b.iter(|| {
                    let mut arena = ExprArena::new();
                    let eq = Equation::new(
                        NAVIER_STOKES_MOMENTUM,
                        ndim,
                        "x",
                        &[],
                        &[],
                        &mut arena,
                    )
                    .unwrap();
                    black_box(eq.expanded.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_scheduling(c: &mut Criterion) {
    c.bench_function("schedule/chain_100", |b| {
        let mut graph = DependencyGraph::new();
        graph.insert("q0", ["base"]);
        for i in 1..100 {
            graph.insert(format!("q{i}"), [format!("q{}", i - 1)]);
        }
        let known: FxHashSet<String> = std::iter::once("base".to_string()).collect();
        b.iter(|| black_box(graph.sort(&known).unwrap().len()));
    });
}

criterion_group!(benches, bench_expansion, bench_scheduling);
criterion_main!(benches);
