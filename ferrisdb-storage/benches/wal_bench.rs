//! Throughput of appending entries to a WAL file and replaying them back
//! with the streaming reader.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrisdb_core::SyncMode;
use ferrisdb_storage::wal::{Entry, Wal};
use tempfile::TempDir;

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal_write");

    for count in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let wal = Wal::open(1, dir.path(), SyncMode::None).unwrap();
                for i in 0..count {
                    wal.write(&Entry::new(
                        format!("key{i}").into_bytes(),
                        format!("value{i}").into_bytes(),
                    ))
                    .unwrap();
                }
                black_box(wal.current_writable_offset());
            });
        });
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal_replay");

    for count in [100, 1_000].iter() {
        let dir = TempDir::new().unwrap();
        let wal = Wal::open(1, dir.path(), SyncMode::None).unwrap();
        for i in 0..*count {
            wal.write(&Entry::new(
                format!("key{i}").into_bytes(),
                format!("value{i}").into_bytes(),
            ))
            .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let mut iter = wal.iterator().unwrap();
                let mut read = 0;
                while iter.next().unwrap().is_some() {
                    read += 1;
                }
                black_box(read);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_replay);
criterion_main!(benches);
