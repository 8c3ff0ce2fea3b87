use criterion::{black_box, criterion_group, criterion_main, Criterion};
use movstat::{MedianEngine, MedianQuery, NanAwareMedianEngine};

fn naive_sliding_median(xs: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(xs.len());
    for i in 0..xs.len() {
        let start = i.saturating_sub(window - 1);
        let mut slice: Vec<f64> = xs[start..=i].to_vec();
        slice.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = slice.len();
        let m = if n % 2 == 1 {
            slice[n / 2]
        } else {
            (slice[n / 2 - 1] + slice[n / 2]) / 2.0
        };
        out.push(m);
    }
    out
}

fn make_input(n: usize) -> Vec<f64> {
    // A deterministic pseudo-random walk, not actually random: criterion
    // runs this many times and we want the same input every time.
    let mut x = 0.0_f64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        x += ((i as f64) * 12.9898).sin() * 43758.5453 % 1.0;
        out.push(x);
    }
    out
}

pub fn bench_median(c: &mut Criterion) {
    let mut group = c.benchmark_group("median");

    for &window in &[8usize, 64, 512] {
        let xs = make_input(20_000);

        group.bench_with_input(format!("paired_heap_w{window}"), &window, |b, &window| {
            b.iter(|| {
                let mut engine = MedianEngine::new(window, window).unwrap();
                for &v in &xs {
                    black_box(engine.feed(v));
                }
            })
        });

        group.bench_with_input(format!("naive_resort_w{window}"), &window, |b, &window| {
            b.iter(|| {
                black_box(naive_sliding_median(&xs, window));
            })
        });
    }

    group.finish();
}

pub fn bench_nan_aware(c: &mut Criterion) {
    let mut group = c.benchmark_group("nan_aware_median");

    for &window in &[8usize, 64, 512] {
        let xs = make_input(20_000);

        group.bench_with_input(format!("nan_rate_0_w{window}"), &window, |b, &window| {
            b.iter(|| {
                let mut engine = NanAwareMedianEngine::new(window, 1).unwrap();
                for &v in &xs {
                    black_box(engine.feed(v));
                }
            })
        });

        group.bench_with_input(format!("nan_rate_20_w{window}"), &window, |b, &window| {
            b.iter(|| {
                let mut engine = NanAwareMedianEngine::new(window, 1).unwrap();
                for (i, &v) in xs.iter().enumerate() {
                    let v = if i % 5 == 0 { f64::NAN } else { v };
                    black_box(engine.feed(v));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_median, bench_nan_aware);
criterion_main!(benches);
