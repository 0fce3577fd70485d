use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use sstable::{generation_path, SSTableReader, SSTableWriter};
use tempfile::tempdir;

const N_KEYS: usize = 10_000;
const VALUE_SIZE: usize = 100;

fn build_entries() -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut entries: Vec<_> = (0..N_KEYS)
        .map(|i| (format!("key{}", i).into_bytes(), vec![b'x'; VALUE_SIZE]))
        .collect();
    entries.sort();
    entries
}

fn sstable_write_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_write_10k", |b| {
        b.iter_batched(
            || (tempdir().unwrap(), build_entries()),
            |(dir, entries)| {
                SSTableWriter::write(dir.path(), 0, &entries).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn sstable_get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_hit_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                SSTableWriter::write(dir.path(), 0, &build_entries()).unwrap();
                let reader = SSTableReader::open(generation_path(dir.path(), 0)).unwrap();
                (dir, reader)
            },
            |(_dir, reader)| {
                for i in 0..N_KEYS {
                    let key = format!("key{}", i);
                    assert!(reader.get(&key).is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn sstable_get_miss_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_miss_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                SSTableWriter::write(dir.path(), 0, &build_entries()).unwrap();
                let reader = SSTableReader::open(generation_path(dir.path(), 0)).unwrap();
                (dir, reader)
            },
            |(_dir, reader)| {
                for i in 0..N_KEYS {
                    let key = format!("missing{}", i);
                    assert!(reader.get(&key).is_none());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    sstable_write_benchmark,
    sstable_get_hit_benchmark,
    sstable_get_miss_benchmark
);
criterion_main!(benches);
