//! Benchmarks for BlobStore operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docshare_crypto::{Cipher, SecretKey};
use docshare_storage::{BlobStore, LocalBlobStore, MemoryBlobStore};
use std::sync::Arc;

fn generate_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn cipher() -> Arc<Cipher> {
    Arc::new(Cipher::new(&SecretKey::generate()))
}

fn bench_memory_save(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryBlobStore::new(cipher(), usize::MAX);

    let mut group = c.benchmark_group("memory_save");
    for size in [1024, 64 * 1024, 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let data = generate_data(size);
            b.iter(|| {
                rt.block_on(async {
                    let name = store.generate_unique_filename("bench.bin");
                    black_box(store.save_encrypted(&data, &name).await.unwrap())
                })
            });
        });
    }
    group.finish();
}

fn bench_local_roundtrip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalBlobStore::new(dir.path(), cipher(), usize::MAX).unwrap();

    let mut group = c.benchmark_group("local_roundtrip");
    for size in [1024, 64 * 1024, 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let data = generate_data(size);
            b.iter(|| {
                rt.block_on(async {
                    let name = store.generate_unique_filename("bench.bin");
                    store.save_encrypted(&data, &name).await.unwrap();
                    let out = store.retrieve_decrypted(&name).await.unwrap();
                    store.delete(&name).await.unwrap();
                    black_box(out)
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_memory_save, bench_local_roundtrip);
criterion_main!(benches);
