// Benchmarks for replica operations.
//
// Covers local typing, random edits and remote replay, plus document
// restores with nested paragraphs.

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use quire::crdt::Char;
use quire::crdt::CharAttributes;
use quire::crdt::DocumentReplica;
use quire::crdt::Replica;

// =============================================================================
// Benchmark Helpers
// =============================================================================

/// Type `count` characters at the end of the replica.
fn sequential_forward(replica: &mut Replica<Char>, count: usize) -> Vec<Char> {
    let mut sent = Vec::with_capacity(count);
    for i in 0..count {
        let value = ((b'a' + (i % 26) as u8) as char).to_string();
        sent.push(replica.local_insert(i, value).unwrap());
    }
    return sent;
}

/// 70% insert, 30% delete at random positions.
fn mixed_operations(replica: &mut Replica<Char>, ops: usize, rng: &mut StdRng) {
    for _ in 0..ops {
        let len = replica.len();
        if len == 0 || rng.gen_bool(0.7) {
            let pos = rng.gen_range(0..=len);
            let value = (rng.gen_range(b'a'..=b'z') as char).to_string();
            replica.local_insert(pos, value).unwrap();
        } else {
            let pos = rng.gen_range(0..len);
            replica.local_delete(pos).unwrap();
        }
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_sequential_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_forward");

    for size in [100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("Replica", size), &size, |b, &size| {
            b.iter(|| {
                let mut replica = Replica::new(1);
                sequential_forward(&mut replica, size);
                black_box(replica.len())
            });
        });
    }

    group.finish();
}

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_operations");

    for ops in [100, 1000] {
        group.throughput(Throughput::Elements(ops as u64));
        group.bench_with_input(BenchmarkId::new("Replica", ops), &ops, |b, &ops| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                let mut replica = Replica::new(1);
                mixed_operations(&mut replica, ops, &mut rng);
                black_box(replica.len())
            });
        });
    }

    group.finish();
}

fn bench_remote_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("remote_replay");

    for size in [100, 1000] {
        let mut source = Replica::new(1);
        let sent = sequential_forward(&mut source, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("Replica", size), &sent, |b, sent| {
            b.iter(|| {
                let mut replica = Replica::new(2);
                for node in sent {
                    replica.remote_insert(node.clone()).unwrap();
                }
                black_box(replica.clock())
            });
        });
    }

    group.finish();
}

fn bench_document_restore(c: &mut Criterion) {
    let mut doc = DocumentReplica::new(1);
    for i in 0..50 {
        let block = doc.local_insert(i, "", "bench").unwrap().node.id;
        let paragraph = doc.paragraph_mut(&block).unwrap();
        for j in 0..40 {
            paragraph
                .local_insert(j, "x", block, "bench", &CharAttributes::default())
                .unwrap();
        }
    }
    let json = doc.to_json().unwrap();

    c.bench_function("document_restore", |b| {
        b.iter(|| {
            let restored = DocumentReplica::from_json(black_box(json.clone())).unwrap();
            black_box(restored.len())
        });
    });
}

criterion_group!(
    benches,
    bench_sequential_forward,
    bench_mixed,
    bench_remote_replay,
    bench_document_restore
);
criterion_main!(benches);
