use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fermat_fft::matrix::{mul_fft, IntMat};
use fermat_fft::{Limb, LIMB_BITS};

// ======================================================================
// UTIL

fn generate_limbs(len: usize, seed: u8) -> Vec<Limb> {
    let mut rng = ChaCha8Rng::from_seed([seed; 32]);
    let mut limbs = vec![0 as Limb; len];
    rng.fill(&mut limbs[..]);
    limbs
}

fn generate_matrix(rows: usize, cols: usize, entry_limbs: usize, seed: u8) -> IntMat {
    let mut rng = ChaCha8Rng::from_seed([seed; 32]);
    let mut m = IntMat::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let mut e = vec![0 as Limb; entry_limbs];
            rng.fill(&mut e[..]);
            m.set_entry(i, j, e);
        }
    }
    m
}

// ======================================================================
// BENCHMARKS - INTEGER MULTIPLY

fn benchmarks_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul");

    for limbs in [100, 1_000, 10_000, 100_000, 1_000_000] {
        if limbs >= 100_000 {
            group.sample_size(10);
        }

        let a = generate_limbs(limbs, 0);
        let b = generate_limbs(limbs, 1);

        group.throughput(Throughput::Bytes((2 * limbs * LIMB_BITS / 8) as u64));
        group.bench_with_input(BenchmarkId::new("balanced", limbs), &limbs, |bench, _| {
            let mut r = vec![0 as Limb; 2 * limbs];
            bench.iter(|| {
                fermat_fft::mul::mul(black_box(&mut r), black_box(&a), black_box(&b))
            });
        });

        group.bench_with_input(BenchmarkId::new("square", limbs), &limbs, |bench, _| {
            let mut r = vec![0 as Limb; 2 * limbs];
            let (x, y) = (&a[..], &a[..]);
            bench.iter(|| {
                fermat_fft::mul::mul(black_box(&mut r), black_box(x), black_box(y))
            });
        });
    }

    group.finish();
}

// ======================================================================
// BENCHMARKS - MATRIX MULTIPLY

fn benchmarks_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");
    group.sample_size(10);

    for (dim, entry_limbs) in [(4, 1_000), (8, 1_000), (8, 10_000), (16, 1_000)] {
        let a = generate_matrix(dim, dim, entry_limbs, 2);
        let b = generate_matrix(dim, dim, entry_limbs, 3);

        let id = format!("{}x{}x{}:{}", dim, dim, dim, entry_limbs);
        group.bench_with_input(BenchmarkId::new("mul_fft", &id), &dim, |bench, _| {
            let mut out = IntMat::new(dim, dim);
            bench.iter(|| mul_fft(black_box(&mut out), black_box(&a), black_box(&b)));
        });
    }

    group.finish();
}

// ======================================================================
// MAIN

criterion_group!(benches, benchmarks_mul, benchmarks_matrix);
criterion_main!(benches);
