use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mixnet_arithm::arithm::array::FileStore;
use mixnet_arithm::arithm::{Backing, LargeInteger, LargeIntegerArray, Permutation};
use mixnet_arithm::eio::StorageDir;
use mixnet_arithm::util::MUL_THREAD_THRESHOLD;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn backings() -> Vec<(&'static str, Backing)> {
    let dir = StorageDir::create_in(std::env::temp_dir()).expect("create storage directory");
    vec![
        ("memory", Backing::Memory),
        ("file", Backing::file(FileStore::new(dir, 10_000, 10_000))),
    ]
}

fn bench_arrays(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(4);
    let modulus = LargeInteger::random_safe_prime(256, &mut rng, 40);
    let mut group = c.benchmark_group("large_integer_array");
    group.sample_size(20);

    for (label, backing) in backings() {
        let size = 50_000;
        let a = LargeIntegerArray::random_mod(&backing, size, &modulus, 40, &mut rng).expect("random array");
        let b = LargeIntegerArray::random_mod(&backing, size, &modulus, 40, &mut rng).expect("random array");
        let permutation = Permutation::random(size, &mut rng, 40);

        group.bench_function(BenchmarkId::new("mod_mul", label), |bench| {
            bench.iter(|| black_box(a.mod_mul(&b, &modulus, MUL_THREAD_THRESHOLD).expect("mod_mul")))
        });
        group.bench_function(BenchmarkId::new("mod_inner", label), |bench| {
            bench.iter(|| black_box(a.mod_inner(&b, &modulus).expect("mod_inner")))
        });
        group.bench_function(BenchmarkId::new("permute", label), |bench| {
            bench.iter(|| black_box(a.permute(&permutation).expect("permute")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_arrays);
criterion_main!(benches);
