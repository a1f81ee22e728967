//! Criterion micro-benchmarks for the workspace arena and staging buffer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_arena::{StagingBuffer, WorkspaceArena};

/// Benchmark: 1K nested reservations followed by LIFO release.
fn bench_workspace_push_pop_1k(c: &mut Criterion) {
    let mut arena = WorkspaceArena::new();
    c.bench_function("workspace_push_pop_1k", |b| {
        b.iter(|| {
            let mut offsets = Vec::with_capacity(1000);
            for i in 0..1000usize {
                offsets.push(arena.allocate(64 + (i % 7) * 16, 16));
            }
            black_box(arena.max_allocated());
            for &off in offsets.iter().rev() {
                arena.free(off);
            }
        });
    });
}

/// Benchmark: stage 10K 256-byte constants from a 4 KiB initial buffer,
/// including every doubling, then drain.
fn bench_staging_write_10k(c: &mut Criterion) {
    let payload = vec![0xA5u8; 256];
    c.bench_function("staging_write_10k", |b| {
        b.iter(|| {
            let mut staging = StagingBuffer::new(4096, 8);
            for _ in 0..10_000 {
                black_box(staging.write(&payload));
            }
            black_box(staging.drain());
        });
    });
}

criterion_group!(benches, bench_workspace_push_pop_1k, bench_staging_write_10k);
criterion_main!(benches);
