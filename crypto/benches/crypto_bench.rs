use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sign_prehash_bench(c: &mut Criterion) {
    let kp = arbiter_crypto::keypair_from_seed(&[42u8; 32]).unwrap();
    let digest = arbiter_crypto::blake2b_256(&[42u8; 128]);

    c.bench_function("secp256k1_sign_prehash", |b| {
        b.iter(|| arbiter_crypto::sign_prehash(black_box(&digest), &kp))
    });
}

fn recover_signer_bench(c: &mut Criterion) {
    let kp = arbiter_crypto::keypair_from_seed(&[42u8; 32]).unwrap();
    let digest = arbiter_crypto::blake2b_256(&[42u8; 128]);
    let sig = arbiter_crypto::sign_prehash(&digest, &kp).unwrap();

    c.bench_function("secp256k1_recover_signer", |b| {
        b.iter(|| arbiter_crypto::recover_signer(black_box(&digest), &sig))
    });
}

fn blake2b_256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("blake2b_256_256B", |b| {
        b.iter(|| arbiter_crypto::blake2b_256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    sign_prehash_bench,
    recover_signer_bench,
    blake2b_256_bench
);
criterion_main!(benches);
