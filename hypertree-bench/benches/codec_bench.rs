//! Descriptor codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hypertree::descriptor::{decode_tree, encode_tree, EncodeOptions, LevelCounts};
use hypertree_bench::data_gen::{generate_grid, grid_sizes};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Codec/Encode");

    for (roots, levels) in grid_sizes() {
        let grid = generate_grid(roots, levels, 42).unwrap();
        let label = format!("{}^3x{}", roots, levels);

        group.bench_with_input(BenchmarkId::new("untrimmed", &label), &grid, |b, grid| {
            b.iter(|| {
                for (_, tree) in grid.trees() {
                    black_box(encode_tree(tree, &EncodeOptions::default()));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("trimmed", &label), &grid, |b, grid| {
            b.iter(|| {
                for (_, tree) in grid.trees() {
                    black_box(encode_tree(tree, &EncodeOptions::trimmed()));
                }
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Codec/Decode");

    for (roots, levels) in grid_sizes() {
        let grid = generate_grid(roots, levels, 42).unwrap();
        let branch_factor = grid.branch_factor();
        let dimension = grid.dimension();
        let encoded: Vec<_> = grid
            .trees()
            .map(|(_, tree)| encode_tree(tree, &EncodeOptions::default()))
            .collect();
        let label = format!("{}^3x{}", roots, levels);

        // Explicit level counts, as v1 and v2 store them
        group.bench_with_input(BenchmarkId::new("explicit", &label), &encoded, |b, encoded| {
            b.iter(|| {
                for descriptor in encoded {
                    let counts = LevelCounts::Explicit(&descriptor.vertices_per_depth);
                    black_box(decode_tree(&descriptor.bits, counts, branch_factor, dimension, None).unwrap());
                }
            });
        });

        // Inferred level counts, as v0 stores them
        group.bench_with_input(BenchmarkId::new("inferred", &label), &encoded, |b, encoded| {
            b.iter(|| {
                for descriptor in encoded {
                    black_box(
                        decode_tree(&descriptor.bits, LevelCounts::Inferred, branch_factor, dimension, None).unwrap(),
                    );
                }
            });
        });

        // Cut at level 2
        group.bench_with_input(BenchmarkId::new("limited", &label), &encoded, |b, encoded| {
            b.iter(|| {
                for descriptor in encoded {
                    let counts = LevelCounts::Explicit(&descriptor.vertices_per_depth);
                    black_box(decode_tree(&descriptor.bits, counts, branch_factor, dimension, Some(2)).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
