// Address derivation and key generation benchmarks for did:valyu.
//
// Covers secp256k1 / X25519 key generation, Keccak-256 over a public key,
// and full user-DID derivation from a hex public key.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use valyu_did::crypto::{keccak256, KeyMaterial, KeyType};
use valyu_did::identity::{derive_ethereum_address, user_did};

fn bench_key_generation(c: &mut Criterion) {
    c.bench_function("secp256k1/keypair_generate", |b| {
        b.iter(|| KeyMaterial::generate(KeyType::SigningSecp256k1));
    });
    c.bench_function("x25519/keypair_generate", |b| {
        b.iter(|| KeyMaterial::generate(KeyType::KeyAgreementX25519));
    });
}

fn bench_keccak(c: &mut Criterion) {
    let mut group = c.benchmark_group("keccak256");
    for size in [64usize, 1024, 16 * 1024] {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| keccak256(data));
        });
    }
    group.finish();
}

fn bench_address_derivation(c: &mut Criterion) {
    let public_key_hex = KeyMaterial::generate(KeyType::SigningSecp256k1).public_key_hex();

    c.bench_function("address/derive_ethereum_address", |b| {
        b.iter(|| derive_ethereum_address(&public_key_hex));
    });

    c.bench_function("address/user_did", |b| {
        b.iter(|| derive_ethereum_address(&public_key_hex).map(|addr| user_did(&addr)));
    });
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_keccak,
    bench_address_derivation
);
criterion_main!(benches);
