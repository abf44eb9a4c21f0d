use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use symgraph::graph::{generator::Generator, parallel_prefix_sum, NodeId};
use symgraph::partition::Partition;
use symgraph::prelude::*;

fn bench_prefix_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_sum");
    for size in [1usize << 12, 1 << 16, 1 << 20] {
        let vals: Vec<i64> = (0..size as i64).map(|i| (i * 31) % 17).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &vals, |b, vals| {
            b.iter(|| parallel_prefix_sum(vals));
        });
    }
    group.finish();
}

fn bench_partition_arithmetic(c: &mut Criterion) {
    c.bench_function("owner_lookup_1m", |b| {
        let p = Partition::with_shape(1 << 20, 0, 8);
        b.iter(|| {
            let mut acc = 0usize;
            for x in (0..1 << 20).step_by(97) {
                acc += p.owner(x as i64);
            }
            acc
        });
    });
}

fn bench_generator(c: &mut Criterion) {
    c.bench_function("kronecker_scale14_single_rank", |b| {
        b.iter(|| {
            World::launch(1, |rank| {
                Ok(Generator::new(14, 8).generate::<NodeId>(rank, false).len())
            })
            .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_prefix_sum,
    bench_partition_arithmetic,
    bench_generator
);
criterion_main!(benches);
