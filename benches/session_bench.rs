use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notesync_core::{Broadcast, JoinSnapshot, Operation, Session};

/// Benchmark sequential typing while the first keystroke is unacknowledged
fn bench_sequential_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_sequential_typing");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut session = Session::new("client1".to_string());
                for i in 0..size {
                    black_box(session.insert(i, "a", |_| {}).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark integrating a remote edit past a backlog of pending edits
fn bench_remote_with_backlog(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_remote_with_backlog");

    for backlog in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(backlog),
            backlog,
            |b, &backlog| {
                b.iter_batched(
                    || {
                        let snapshot = JoinSnapshot::new("x".repeat(64), 0);
                        let mut session = Session::join("client1".to_string(), &snapshot);
                        for i in 0..backlog {
                            session.insert(i * 2 % 64, "a", |_| {}).unwrap();
                        }
                        session
                    },
                    |mut session| {
                        let remote = Operation::delete("xxxx", 0, 0, "client2".to_string());
                        let broadcast = Broadcast::new("client2".to_string(), remote, 1);
                        black_box(session.receive(broadcast, |_| {}).unwrap());
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark draining a queue through acknowledgments
fn bench_acknowledge_drain(c: &mut Criterion) {
    c.bench_function("session_acknowledge_drain_100", |b| {
        b.iter_batched(
            || {
                let mut session = Session::new("client1".to_string());
                for i in 0..100 {
                    session.insert(i, "a", |_| {}).unwrap();
                }
                session
            },
            |mut session| {
                for revision in 1..=100 {
                    session.acknowledge(revision, |_| {}).unwrap();
                }
                black_box(session)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_sequential_typing,
    bench_remote_with_backlog,
    bench_acknowledge_drain
);
criterion_main!(benches);
