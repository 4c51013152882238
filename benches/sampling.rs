use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ssample::reservoir::{ReservoirSampler, SharedReservoir};
use ssample::OutputFormat;

fn lines(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{i:08} some log line payload")).collect()
}

fn bench_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("admit");

    let sizes = [1_000, 10_000, 100_000];
    let k = 100;

    for &size in &sizes {
        let input = lines(size);
        group.bench_function(format!("owned_n{}_k{}", size, k), |b| {
            b.iter(|| {
                let mut sampler = ReservoirSampler::with_rng(k, ChaCha8Rng::seed_from_u64(1));
                for line in &input {
                    sampler.admit(black_box(line.as_str()));
                }
                black_box(sampler.seen());
            })
        });
    }

    for &size in &sizes {
        let input = lines(size);
        group.bench_function(format!("shared_n{}_k{}", size, k), |b| {
            b.iter(|| {
                let shared = SharedReservoir::from_sampler(ReservoirSampler::with_rng(
                    k,
                    ChaCha8Rng::seed_from_u64(1),
                ));
                for line in &input {
                    shared.admit(black_box(line.as_str()));
                }
                black_box(shared.seen_count());
            })
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for &k in &[100, 1_000, 10_000] {
        let shared = SharedReservoir::from_sampler(ReservoirSampler::with_rng(
            k,
            ChaCha8Rng::seed_from_u64(2),
        ));
        for line in lines(k * 10) {
            shared.admit(line);
        }

        group.bench_function(format!("copy_sort_k{}", k), |b| {
            b.iter(|| black_box(shared.snapshot()))
        });

        let snapshot = shared.snapshot();
        for format in [OutputFormat::Json, OutputFormat::Numbered] {
            group.bench_function(format!("render_{}_k{}", format, k), |b| {
                b.iter(|| black_box(snapshot.render(format)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_admit, bench_snapshot);
criterion_main!(benches);
