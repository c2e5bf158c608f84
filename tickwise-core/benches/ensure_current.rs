//! Benchmarks for per-epoch query evaluation
//!
//! Run with: cargo bench -p tickwise-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tickwise_core::graph::QueryId;
use tickwise_core::query::{Derives, Exposes, Node, QueryEngine};

struct Frame {
    dt: f32,
}

struct Layered {
    parents: Vec<QueryId>,
    value: f32,
}

impl Derives<Frame> for Layered {
    fn derive(&mut self, state: &Frame, engine: &QueryEngine) {
        let mut value = state.dt;
        for &parent in &self.parents {
            value += engine.value::<f32>(parent);
        }
        self.value = value;
    }
}

impl Exposes<f32> for Layered {
    fn value(&self) -> &f32 {
        &self.value
    }
}

/// Build `depth` layers of `width` queries; each query reads up to `fan_in`
/// queries of the layer below, so every parent-count encoding shows up.
fn build(width: usize, depth: usize, fan_in: usize) -> (QueryEngine, Vec<QueryId>) {
    let mut engine = QueryEngine::new(width * depth);
    let id = |d: usize, w: usize| QueryId::from_index(d * width + w).unwrap();

    for d in 0..depth {
        for w in 0..width {
            let parents: Vec<QueryId> = if d == 0 {
                Vec::new()
            } else {
                (0..fan_in.min(width)).map(|k| id(d - 1, (w + k) % width)).collect()
            };
            let node = Node::new(Layered {
                parents: parents.clone(),
                value: 0.0,
            })
            .derives::<Frame>()
            .exposes::<f32>();
            engine.register(id(d, w), node, &parents);
        }
    }

    let sinks = (0..width).map(|w| id(depth - 1, w)).collect();
    (engine, sinks)
}

fn bench_epoch(c: &mut Criterion) {
    let mut group = c.benchmark_group("epoch");

    for fan_in in [1, 2, 4] {
        let (width, depth) = (64, 32);
        let (mut engine, sinks) = build(width, depth, fan_in);
        group.throughput(Throughput::Elements((width * depth) as u64));
        group.bench_with_input(BenchmarkId::new("fan_in", fan_in), &fan_in, |b, _| {
            b.iter(|| {
                engine.begin_epoch();
                engine.ensure_all_current(&Frame { dt: 0.016 }, sinks.iter().copied());
                black_box(engine.value::<f32>(sinks[0]))
            })
        });
    }

    group.finish();
}

fn bench_memoized_hit(c: &mut Criterion) {
    let (mut engine, sinks) = build(64, 32, 4);
    engine.begin_epoch();
    engine.ensure_all_current(&Frame { dt: 0.016 }, sinks.iter().copied());

    c.bench_function("memoized_hit", |b| {
        b.iter(|| engine.ensure_current(&Frame { dt: 0.016 }, black_box(sinks[0])))
    });
}

criterion_group!(benches, bench_epoch, bench_memoized_hit);
criterion_main!(benches);
