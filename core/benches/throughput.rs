// Whole-buffer engine throughput at 1 and 4 workers, with and without integrity.
//
// RUST_LOG=ctrstream_core=debug shows partitioning and per-segment logs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tracing_subscriber::EnvFilter;

use ctrstream_core::engine::{Decryptor, EngineConfig, Encryptor};
use ctrstream_core::types::EncryptionFormat;

const KEY: [u8; 32] = [0x11; 32];
const HASH_KEY: [u8; 32] = [0x22; 32];
const NONCE: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];
const SIZE: usize = 8 * 1024 * 1024;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn bench_engine(c: &mut Criterion) {
    init_logging();
    let data: Vec<u8> = (0..SIZE).map(|i| (i % 251) as u8).collect();

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Bytes(SIZE as u64));
    group.sample_size(10);

    for threads in [1usize, 4] {
        let cfg = EngineConfig::default().with_threads(threads);
        let enc = Encryptor::new(cfg.clone());
        let dec = Decryptor::new(cfg);

        for integrity in [false, true] {
            let hash_key = integrity.then_some(&HASH_KEY[..]);
            let label = if integrity { "hmac" } else { "plain" };

            group.bench_with_input(BenchmarkId::new(format!("encrypt/{label}"), threads), &data, |b, data| {
                b.iter(|| {
                    enc.encrypt(black_box(data), &KEY, &NONCE, EncryptionFormat::Salmon, integrity, hash_key, None)
                        .unwrap()
                })
            });

            let sealed = enc
                .encrypt(&data, &KEY, &NONCE, EncryptionFormat::Salmon, integrity, hash_key, None)
                .unwrap();
            group.bench_with_input(BenchmarkId::new(format!("decrypt/{label}"), threads), &sealed, |b, sealed| {
                b.iter(|| {
                    dec.decrypt(black_box(sealed), &KEY, None, EncryptionFormat::Salmon, integrity, hash_key, None)
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
