use adaptfilt::{AdaptationConfig, AdaptiveFilter, SignMode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BLOCK: usize = 256;

fn signals(len: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let input: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
    // Desired: input through a short decaying echo.
    let desired = (0..len)
        .map(|n| {
            (0..8)
                .filter(|k| *k <= n)
                .map(|k| 0.5f64.powi(k as i32 + 1) * input[n - k])
                .sum()
        })
        .collect();
    (input, desired)
}

fn configs(order: usize) -> [(&'static str, AdaptationConfig); 4] {
    [
        ("lms", AdaptationConfig::lms(order, 0.01 / order as f64)),
        ("nlms", AdaptationConfig::nlms(order, 0.5)),
        ("sign_lms", AdaptationConfig::sign_lms(order, 0.001, SignMode::SignError)),
        ("rls", AdaptationConfig::rls(order, 0.999)),
    ]
}

// Per-sample latency of the streaming path.
fn bench_process_one(c: &mut Criterion) {
    let (input, desired) = signals(4096);

    for order in [8usize, 32, 128] {
        let mut group = c.benchmark_group(format!("process_one_{}_taps", order));
        for (name, config) in configs(order) {
            if name == "rls" && order > 32 {
                // O(N²) per sample; measured separately below.
                continue;
            }
            group.bench_function(name, |b| {
                let mut filter = AdaptiveFilter::new(config.clone()).unwrap();
                let mut n = 0;
                b.iter(|| {
                    let i = n % input.len();
                    n += 1;
                    black_box(filter.process_one(black_box(input[i]), black_box(desired[i])))
                });
            });
        }
        group.finish();
    }
}

fn bench_process_batch(c: &mut Criterion) {
    let (input, desired) = signals(BLOCK);
    let mut group = c.benchmark_group("process_batch_256");
    group.throughput(Throughput::Elements(BLOCK as u64));

    for (name, config) in configs(32) {
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            let mut filter = AdaptiveFilter::new(config.clone()).unwrap();
            b.iter(|| black_box(filter.process_batch(black_box(&input), black_box(&desired))));
        });
    }
    group.finish();
}

fn bench_rls_order(c: &mut Criterion) {
    let (input, desired) = signals(BLOCK);
    let mut group = c.benchmark_group("rls_order_scaling");
    group.throughput(Throughput::Elements(BLOCK as u64));

    for order in [8usize, 16, 32, 64] {
        for interval in [1usize, 0] {
            let config = AdaptationConfig::rls(order, 0.999).with_symmetrize_interval(interval);
            let label = format!("{}_taps_symmetrize_{}", order, interval);
            group.bench_function(label, |b| {
                let mut filter = AdaptiveFilter::new(config.clone()).unwrap();
                b.iter(|| black_box(filter.process_batch(&input, &desired)));
            });
        }
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_only");
    for order in [32usize, 128] {
        let filter = AdaptiveFilter::new(AdaptationConfig::nlms(order, 0.5)).unwrap();
        group.bench_function(format!("{}_taps", order), |b| {
            b.iter(|| black_box(filter.predict(black_box(1.0))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_process_one,
    bench_process_batch,
    bench_rls_order,
    bench_predict
);
criterion_main!(benches);
