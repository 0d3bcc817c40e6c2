//! Benchmark: Stage Planning
//!
//! Measures StagePlan construction and staged resolution.
//! Run: cargo bench --bench stage_planning

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use stagehand::{inject_fn, ready, Args, Payload, Resolver, StagePlan};

fn first_plus_one(args: Args) -> stagehand::payload::Outcome {
    Ok(json!(args.get(0).as_i64().unwrap_or(0) + 1))
}

/// Generate a chain: k0 <- k1 <- k2 <- ...
fn generate_chain(size: usize) -> Payload {
    let mut payload = Payload::with_capacity(size);
    payload.insert("k0", ready(0));
    for i in 1..size {
        payload.insert(
            format!("k{}", i),
            inject_fn(first_plus_one).on([format!("k{}", i - 1)]),
        );
    }
    payload
}

/// Generate a diamond: source -> (middle_*) -> sink
fn generate_diamond(width: usize) -> Payload {
    let middles: Vec<String> = (0..width).map(|i| format!("middle_{}", i)).collect();
    let mut payload = Payload::with_capacity(width + 2);
    payload.insert("source", ready(1));
    for name in &middles {
        payload.insert(name.as_str(), inject_fn(first_plus_one).on(["source"]));
    }
    payload.insert(
        "sink",
        inject_fn(|args| Ok(json!(args.len()))).on(&middles),
    );
    payload
}

/// Generate a wide payload of independent values
fn generate_parallel(size: usize) -> Payload {
    (0..size)
        .map(|i| (format!("k{}", i), ready(Value::from(i as u64))))
        .collect()
}

fn bench_plan_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_plan_build");

    for size in [10, 50, 100, 250].iter() {
        let payload = generate_chain(*size);
        group.bench_with_input(BenchmarkId::new("chain", size), &payload, |b, p| {
            b.iter(|| black_box(StagePlan::build(black_box(p))));
        });
    }

    for width in [10, 50, 100].iter() {
        let payload = generate_diamond(*width);
        group.bench_with_input(BenchmarkId::new("diamond", width), &payload, |b, p| {
            b.iter(|| black_box(StagePlan::build(black_box(p))));
        });
    }

    for size in [10, 100, 1000].iter() {
        let payload = generate_parallel(*size);
        group.bench_with_input(BenchmarkId::new("parallel", size), &payload, |b, p| {
            b.iter(|| black_box(StagePlan::build(black_box(p))));
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let resolver = Resolver::default();
    let mut group = c.benchmark_group("resolve");

    for size in [10, 50].iter() {
        group.bench_with_input(BenchmarkId::new("chain", size), size, |b, &n| {
            b.to_async(&rt)
                .iter(|| async { black_box(resolver.run(generate_chain(n), &[]).await) });
        });
    }

    for width in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("diamond", width), width, |b, &n| {
            b.to_async(&rt)
                .iter(|| async { black_box(resolver.run(generate_diamond(n), &[]).await) });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan_construction, bench_resolution);
criterion_main!(benches);
