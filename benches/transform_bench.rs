use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notesync_core::transform::{sequence, transform, transform_prior};
use notesync_core::Operation;

fn ins(text: &str, position: usize) -> Operation {
    Operation::insert(text, position, 0, "client1".to_string())
}

fn del(text: &str, position: usize) -> Operation {
    Operation::delete(text, position, 0, "client2".to_string())
}

/// Benchmark each pairwise case once
fn bench_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_pairwise");

    let cases = [
        ("insert_insert", ins("abc", 10), ins("xyz", 10)),
        ("insert_delete", ins("abc", 12), del("hello", 10)),
        ("delete_insert_split", del("hello world", 10), ins("xyz", 15)),
        ("delete_delete_overlap", del("hello", 10), del("lowor", 13)),
    ];

    for (name, a, b) in cases.iter() {
        group.bench_function(*name, |bench| {
            bench.iter(|| black_box(transform(black_box(a), black_box(b))));
        });
    }

    group.finish();
}

/// Benchmark carrying one remote operation past a queue of local edits
fn bench_queue_crossing(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_queue_crossing");

    for size in [10, 100, 1000].iter() {
        let local: Vec<Operation> = (0..*size).map(|i| ins("a", i)).collect();
        let remote = del(&"b".repeat(4), 0);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut incoming = remote.clone();
                for op in &local {
                    black_box(transform(op, &incoming));
                    if let Some(next) = transform_prior(&incoming, op).into_iter().next() {
                        incoming = next;
                    }
                }
                black_box(incoming)
            });
        });
    }

    group.finish();
}

/// Benchmark ordering a set of disjoint deletes
fn bench_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_sequence");

    for size in [2, 16, 256].iter() {
        let ops: Vec<Operation> = (0..*size).rev().map(|i| del("ab", i * 3)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(sequence(ops.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pairwise, bench_queue_crossing, bench_sequence);
criterion_main!(benches);
