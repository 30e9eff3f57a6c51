//! Benchmarks the binary search `Ring::entry_at_offset` performs on every
//! viewport render. Mirrors the teacher's practice of benchmarking its own
//! bisection-heavy lookup (`core-text`'s line-index search) at a size
//! representative of real use: the ring's default 20,000-entry capacity.

use criterion::{Criterion, criterion_group, criterion_main};
use core_entry::LogEntry;
use core_ring::Ring;

fn build_full_ring(capacity: usize) -> Ring {
    let mut ring = Ring::new(capacity);
    let mut cum = 0usize;
    for i in 0..capacity {
        let height = 1 + (i % 3);
        cum += height;
        ring.append(LogEntry {
            raw: format!("line {i}"),
            parsed: None,
            show: true,
            formatted: "x".repeat(height),
            height,
            cum_height: cum,
            index: i as u64,
        });
    }
    ring
}

fn bench_entry_at_offset(c: &mut Criterion) {
    let ring = build_full_ring(20_000);
    let total = ring.total_height();

    c.bench_function("entry_at_offset/full_20k_middle", |b| {
        b.iter(|| ring.entry_at_offset(total / 2))
    });

    c.bench_function("entry_at_offset/full_20k_tail", |b| {
        b.iter(|| ring.entry_at_offset(total - 1))
    });

    c.bench_function("entry_at_offset/full_20k_head", |b| {
        b.iter(|| ring.entry_at_offset(0))
    });
}

criterion_group!(benches, bench_entry_at_offset);
criterion_main!(benches);
